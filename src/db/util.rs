use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnNote {
  /// Assigned by the database on insert (serial ids).
  Primary,
  /// Has a database default (timestamps).
  Generated,
  None,
}

#[derive(Debug, Clone)]
pub struct ColumnMapper {
  pub name: String,
  pub column: String,
  pub note: ColumnNote,
}

impl Default for ColumnMapper {
  fn default() -> Self {
    Self {
      name: "".to_string(),
      column: "".to_string(),
      note: ColumnNote::None,
    }
  }
}

pub fn column(name: &'static str) -> ColumnMapper {
  ColumnMapper {
    name: name.to_string(),
    column: name.to_string(),
    note: ColumnNote::None,
  }
}

pub fn quoted(name: &'static str) -> ColumnMapper {
  ColumnMapper {
    name: name.to_string(),
    column: format!(r#""{}""#, name),
    note: ColumnNote::None,
  }
}

impl ColumnMapper {
  pub fn primary(mut self) -> Self {
    self.note = ColumnNote::Primary;
    self
  }

  pub fn generated(mut self) -> Self {
    self.note = ColumnNote::Generated;
    self
  }

  fn is_input(&self) -> bool {
    self.note == ColumnNote::None
  }
}

#[derive(Debug, Default, Clone)]
pub struct ColumnMappers {
  pub table_name: &'static str,
  pub columns: Vec<ColumnMapper>,
}

impl ColumnMappers {
  /// Comma separated column list, optionally qualified with a table alias.
  pub fn get_columns(&self, alias: Option<&str>) -> String {
    self.columns.iter().map(|col| {
      match alias {
        Some(alias) => format!("{}.{}", alias, col.column),
        None => col.column.clone(),
      }
    }).collect::<Vec<String>>().join(", ")
  }

  pub fn build_select_query(&self) -> String {
    format!("SELECT {} FROM {}", self.get_columns(None), self.table_name)
  }

  /// INSERT of every input column, returning the database assigned ones.
  pub fn build_insert_query(&self) -> String {
    let mut buf = String::new();
    let mut idx = 0;
    let mut values = Vec::new();
    let mut returning = Vec::new();
    write!(buf, "INSERT INTO {}(", self.table_name).unwrap();
    for col in self.columns.iter() {
      if col.is_input() {
        if idx > 0 {
          write!(buf, ", ").unwrap();
        }
        idx += 1;
        values.push(format!("${}", idx));
        write!(buf, "{}", col.column).unwrap();
      } else {
        returning.push(col.column.clone());
      }
    }
    write!(buf, ") VALUES({})", values.join(", ")).unwrap();
    if !returning.is_empty() {
      write!(buf, " RETURNING {}", returning.join(", ")).unwrap();
    }
    buf
  }

  /// INSERT that ignores rows which already exist.
  pub fn build_insert_ignore(&self, on_conflict: &str) -> String {
    let mut buf = String::new();
    let mut idx = 0;
    let mut values = Vec::new();
    write!(buf, "INSERT INTO {}(", self.table_name).unwrap();
    for col in self.columns.iter().filter(|col| col.is_input()) {
      if idx > 0 {
        write!(buf, ", ").unwrap();
      }
      idx += 1;
      values.push(format!("${}", idx));
      write!(buf, "{}", col.column).unwrap();
    }
    write!(buf, ") VALUES({}) ON CONFLICT {} DO NOTHING", values.join(", "), on_conflict).unwrap();
    buf
  }
}
