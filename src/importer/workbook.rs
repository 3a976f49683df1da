// ==========================================
// Sustain 4.0 BioEngine - 工作簿内存模型
// ==========================================
// 职责: 以“命名工作表 + 文本单元格”表示任意表格数据源
// 说明: Excel / CSV 目录 / 模板生成器均产出该结构
// ==========================================

/// 单个工作表（行优先,单元格已 trim）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// 追加一行
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rows
            .push(cells.into_iter().map(|c| c.as_ref().trim().to_string()).collect());
    }

    /// 构建器风格的 push_row
    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.push_row(cells);
        self
    }

    /// 表头所在下标: 第一个含非空单元格的行
    fn header_index(&self) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.iter().any(|cell| !cell.is_empty()))
    }

    /// 第一个非空行作为表头（跳过表格上方的空行）
    pub fn header(&self) -> Option<&[String]> {
        self.header_index().map(|idx| self.rows[idx].as_slice())
    }

    /// 表头之后的数据行,附带表格行号（从 1 开始的绝对行号）
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        let start = self.header_index().map_or(self.rows.len(), |idx| idx + 1);
        self.rows
            .iter()
            .enumerate()
            .skip(start)
            .map(|(idx, row)| (idx + 1, row.as_slice()))
    }

    /// 全部行（无表头的键值表使用）
    pub fn all_rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (idx + 1, row.as_slice()))
    }
}

/// 工作簿: 按插入顺序保存工作表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加工作表;同名工作表被替换
    pub fn add_sheet(&mut self, sheet: Sheet) {
        match self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }

    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.add_sheet(sheet);
        self
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_rows_numbering() {
        let sheet = Sheet::new("Exchanges")
            .with_row(["Activity Code", "Amount"])
            .with_row(["FERM_01", " 1.0 "])
            .with_row(["DIST_01", "2"]);

        let rows: Vec<(usize, &[String])> = sheet.data_rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 2);
        assert_eq!(rows[0].1[1], "1.0");
        assert_eq!(rows[1].0, 3);
    }

    #[test]
    fn test_header_skips_leading_blank_rows() {
        let mut sheet = Sheet::new("Process Activities");
        sheet.rows.push(Vec::new());
        sheet.push_row(["", ""]);
        sheet.push_row(["Activity Code", "Activity Name"]);
        sheet.push_row(["FERM_01", "Fermentation"]);

        assert_eq!(
            sheet.header().unwrap(),
            ["Activity Code".to_string(), "Activity Name".to_string()]
        );
        let rows: Vec<(usize, &[String])> = sheet.data_rows().collect();
        assert_eq!(rows.len(), 1);
        // 行号仍为工作表中的绝对位置
        assert_eq!(rows[0].0, 4);
        assert_eq!(rows[0].1[0], "FERM_01");
    }

    #[test]
    fn test_blank_sheet_has_no_header_or_data() {
        let mut sheet = Sheet::new("Exchanges");
        sheet.rows.push(Vec::new());

        assert!(sheet.header().is_none());
        assert_eq!(sheet.data_rows().count(), 0);
    }

    #[test]
    fn test_add_sheet_replaces_same_name() {
        let mut workbook = Workbook::new();
        workbook.add_sheet(Sheet::new("A").with_row(["1"]));
        workbook.add_sheet(Sheet::new("B"));
        workbook.add_sheet(Sheet::new("A").with_row(["2"]));

        assert_eq!(workbook.sheet_names(), vec!["A", "B"]);
        assert_eq!(workbook.sheet("A").unwrap().rows[0][0], "2");
    }
}
