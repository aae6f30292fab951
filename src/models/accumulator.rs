use crate::models::batch::Section;
use crate::models::record::Record;

/// 单个文档在内存中累积的记录，按部分分开保存
///
/// 部分完成或用户停止时被取出并写盘
#[derive(Debug, Default)]
pub struct AccumulatedOutput {
    mids: Vec<Record>,
    finals: Vec<Record>,
}

impl AccumulatedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, section: Section, records: Vec<Record>) {
        self.section_mut(section).extend(records);
    }

    pub fn len(&self, section: Section) -> usize {
        match section {
            Section::Mids => self.mids.len(),
            Section::Finals => self.finals.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mids.is_empty() && self.finals.is_empty()
    }

    /// 取出某部分的全部记录，原位置清空
    pub fn take(&mut self, section: Section) -> Vec<Record> {
        std::mem::take(self.section_mut(section))
    }

    fn section_mut(&mut self, section: Section) -> &mut Vec<Record> {
        match section {
            Section::Mids => &mut self.mids,
            Section::Finals => &mut self.finals,
        }
    }
}

/// 按处理顺序重新编号为 1..N
pub fn renumber(records: &mut [Record]) {
    for (i, record) in records.iter_mut().enumerate() {
        record.set_id(i + 1);
    }
}
