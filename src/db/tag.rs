use tokio_postgres::Row;

use crate::error::*;
use crate::models::*;

use crate::db::client::*;
use crate::db::util::*;

#[derive(Clone)]
pub struct TagService {
  // get all tags (reader connection)
  get_tags: VersionedStatement,

  // connect-or-create (writer connection)
  tag_by_name: VersionedStatement,
  store_tag: VersionedStatement,
}

lazy_static! {
  static ref TAG_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "tags",
      columns: vec![
        column("id").primary(),
        column("name"),
      ],
    }
  };
}

pub fn tag_from_row(row: &Row) -> Tag {
  Tag {
    id: row.get(0),
    name: row.get(1),
  }
}

impl TagService {
  pub fn new(read_cl: SharedClient, write_cl: SharedClient) -> TagService {
    let select = TAG_COLUMNS.build_select_query();
    let get_tags = VersionedStatement::new(read_cl,
        &format!("{} ORDER BY name", select));

    let tag_by_name = VersionedStatement::new(write_cl.clone(),
        &format!("{} WHERE name = $1", select));
    let store_tag = VersionedStatement::new(write_cl,
        &TAG_COLUMNS.build_insert_query());

    TagService {
      get_tags,
      tag_by_name,
      store_tag,
    }
  }

  pub async fn prepare(&self) -> Result<()> {
    self.get_tags.prepare().await?;
    self.tag_by_name.prepare().await?;
    self.store_tag.prepare().await?;
    Ok(())
  }

  pub async fn get_tags(&self) -> Result<Vec<Tag>> {
    let rows = self.get_tags.query(&[]).await?;
    Ok(rows.iter().map(tag_from_row).collect())
  }

  pub async fn find_in(&self, tx_cl: &RefClient, name: &str) -> Result<Option<Tag>> {
    let row = self.tag_by_name.query_opt_in(tx_cl, &[&name]).await?;
    Ok(row.as_ref().map(tag_from_row))
  }

  /// Plain INSERT: a concurrent insert of the same name surfaces as a
  /// `unique_violation`.
  pub async fn store_in(&self, tx_cl: &RefClient, name: &str) -> Result<Tag> {
    let row = self.store_tag.query_one_in(tx_cl, &[&name]).await?;
    Ok(Tag {
      id: row.get(0),
      name: name.to_string(),
    })
  }
}
