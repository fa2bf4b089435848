// crates/adc_mesh/src/resolver.rs
//! 标识解析
//!
//! 把外部标识映射为数组下标。标识按 1 起始连续编号（逻辑编号）时
//! 直接用 `label - 1`，否则查表。
//!
//! 读取文件时按顺序调用 [`IdResolver::observe`]，只记录是否出现过
//! `position != label - 1`；查找表在 [`IdResolver::finish`] 中一次性构建，
//! 不在每条记录上重建。
//!
//! 逐条追加或替换记录时用 [`IdResolver::push`]、[`IdResolver::replace`]
//! 增量维护；删除会平移其后所有下标，调用 [`IdResolver::rebuild`]。

use crate::error::{MeshError, MeshResult};
use std::collections::HashMap;

/// 标识到下标的解析器
#[derive(Debug, Clone)]
pub struct IdResolver {
    what: &'static str,
    /// `label != position + 1` 的记录数，为零即逻辑编号
    misplaced: usize,
    /// 首次离开逻辑编号时构建，之后随增删维护
    table: Option<HashMap<usize, usize>>,
}

impl IdResolver {
    /// 创建解析器，初始为逻辑编号
    pub fn new(what: &'static str) -> Self {
        Self {
            what,
            misplaced: 0,
            table: None,
        }
    }

    /// 是否为逻辑编号
    #[inline]
    pub fn is_logical(&self) -> bool {
        self.misplaced == 0
    }

    /// 记录一条读入的记录
    ///
    /// 出现不连续的标识后，该实体类型切换为查表模式。
    #[inline]
    pub fn observe(&mut self, position: usize, label: usize) {
        if label != position + 1 {
            self.misplaced += 1;
        }
    }

    /// 结束一次读入；非逻辑编号时构建查找表
    pub fn finish(&mut self, labels: impl IntoIterator<Item = usize>) {
        self.table = (!self.is_logical()).then(|| collect_table(labels));
    }

    /// 按当前标识整体重建
    ///
    /// 存储被整体替换或删除记录后调用。
    pub fn rebuild(&mut self, labels: &[usize]) {
        self.misplaced = labels
            .iter()
            .enumerate()
            .filter(|&(position, &label)| label != position + 1)
            .count();
        self.finish(labels.iter().copied());
    }

    /// 在 `position`（原长度）处追加一条记录
    ///
    /// `labels` 为追加后的全部标识，只在首次切换到查表模式时遍历。
    pub fn push(&mut self, position: usize, label: usize, labels: impl IntoIterator<Item = usize>) {
        self.observe(position, label);
        let logical = self.is_logical();
        match &mut self.table {
            Some(table) => {
                table.insert(label, position);
            }
            None if !logical => self.table = Some(collect_table(labels)),
            None => {}
        }
    }

    /// 把 `position` 处的标识由 `old` 换为 `label`
    ///
    /// `labels` 为替换后的全部标识，只在首次切换到查表模式时遍历。
    pub fn replace(
        &mut self,
        position: usize,
        old: usize,
        label: usize,
        labels: impl IntoIterator<Item = usize>,
    ) {
        if old != position + 1 {
            self.misplaced = self.misplaced.saturating_sub(1);
        }
        self.observe(position, label);
        let logical = self.is_logical();
        match &mut self.table {
            Some(table) => {
                if table.get(&old) == Some(&position) {
                    table.remove(&old);
                }
                table.insert(label, position);
            }
            None if !logical => self.table = Some(collect_table(labels)),
            None => {}
        }
    }

    /// 标识对应的下标
    ///
    /// # Errors
    /// 逻辑编号下超出 `[1, len]` 或查表模式下标识不存在时返回 [`MeshError::NotFound`]。
    pub fn index_of(&self, label: usize, len: usize) -> MeshResult<usize> {
        if self.is_logical() {
            if label >= 1 && label <= len {
                Ok(label - 1)
            } else {
                Err(MeshError::not_found(self.what, label))
            }
        } else {
            self.table
                .as_ref()
                .and_then(|table| table.get(&label))
                .copied()
                .ok_or_else(|| MeshError::not_found(self.what, label))
        }
    }
}

fn collect_table(labels: impl IntoIterator<Item = usize>) -> HashMap<usize, usize> {
    labels
        .into_iter()
        .enumerate()
        .map(|(position, label)| (label, position))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical() {
        let mut r = IdResolver::new("节点");
        for i in 0..5 {
            r.observe(i, i + 1);
        }
        r.finish(1..=5);
        assert!(r.is_logical());
        assert_eq!(r.index_of(3, 5).unwrap(), 2);
        assert!(r.index_of(0, 5).is_err());
        assert!(r.index_of(6, 5).unwrap_err().is_not_found());
    }

    #[test]
    fn test_non_logical() {
        let labels = [5, 3, 1, 4, 2];
        let mut r = IdResolver::new("节点");
        for (i, &l) in labels.iter().enumerate() {
            r.observe(i, l);
        }
        r.finish(labels);
        assert!(!r.is_logical());
        assert_eq!(r.index_of(3, 5).unwrap(), 1);
        for (i, &l) in labels.iter().enumerate() {
            assert_eq!(r.index_of(l, 5).unwrap(), i);
        }
        assert!(r.index_of(6, 5).is_err());
    }

    #[test]
    fn test_push_and_replace() {
        let mut labels = vec![1, 2];
        let mut r = IdResolver::new("节点");
        r.rebuild(&labels);

        labels.push(3);
        r.push(2, 3, labels.iter().copied());
        assert!(r.is_logical());

        labels.push(9);
        r.push(3, 9, labels.iter().copied());
        assert!(!r.is_logical());
        assert_eq!(r.index_of(9, 4).unwrap(), 3);
        assert_eq!(r.index_of(2, 4).unwrap(), 1);

        labels[3] = 4;
        r.replace(3, 9, 4, labels.iter().copied());
        assert!(r.is_logical());
        assert!(r.index_of(9, 4).is_err());

        labels[0] = 7;
        r.replace(0, 1, 7, labels.iter().copied());
        assert_eq!(r.index_of(7, 4).unwrap(), 0);
        assert!(r.index_of(1, 4).unwrap_err().is_not_found());
        assert_eq!(r.index_of(4, 4).unwrap(), 3);
    }

    #[test]
    fn test_rebuild() {
        let mut r = IdResolver::new("单元");
        r.rebuild(&[1, 2, 10]);
        assert!(!r.is_logical());
        assert_eq!(r.index_of(10, 3).unwrap(), 2);
        r.rebuild(&[1, 2, 3]);
        assert!(r.is_logical());
    }
}
