use tokio_postgres::Row;

use crate::error::*;
use crate::forms::NewReminder;
use crate::models::*;

use crate::db::client::*;
use crate::db::util::*;

#[derive(Clone)]
pub struct ReminderService {
  // listing (reader connection)
  get_reminders: VersionedStatement,

  // store reminder (writer connection)
  store_reminder: VersionedStatement,
  add_tag: VersionedStatement,
}

lazy_static! {
  static ref REMINDER_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "reminders",
      columns: vec![
        column("id").primary(),
        column("title"),
        column("img_url"),
        quoted("date"),
        column("created_at").generated(),
      ],
    }
  };

  static ref REMINDER_TAG_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "reminder_tags",
      columns: vec![
        column("reminder_id"),
        column("tag_id"),
      ],
    }
  };

  static ref REMINDER_DETAILS_SELECT: String = format!(r#"
SELECT {},
  (SELECT COALESCE(ARRAY_AGG(t.id ORDER BY t.name), '{{}}'::integer[])
    FROM reminder_tags rt INNER JOIN tags t ON rt.tag_id = t.id
    WHERE rt.reminder_id = r.id) AS TagIds,
  (SELECT COALESCE(ARRAY_AGG(t.name ORDER BY t.name), '{{}}'::text[])
    FROM reminder_tags rt INNER JOIN tags t ON rt.tag_id = t.id
    WHERE rt.reminder_id = r.id) AS TagNames
FROM reminders r
"#, REMINDER_COLUMNS.get_columns(Some("r")));
}

fn reminder_from_row(row: &Row) -> Reminder {
  let tag_ids: Vec<i32> = row.get(5);
  let tag_names: Vec<String> = row.get(6);

  Reminder {
    id: row.get(0),
    title: row.get(1),
    img_url: row.get(2),
    date: row.get(3),
    created_at: row.get(4),
    tags: tag_ids.into_iter().zip(tag_names)
      .map(|(id, name)| Tag { id, name })
      .collect(),
  }
}

impl ReminderService {
  pub fn new(read_cl: SharedClient, write_cl: SharedClient) -> ReminderService {
    let get_reminders = VersionedStatement::new(read_cl,
        &format!(r#"{} ORDER BY r."date" ASC, r.id ASC"#, *REMINDER_DETAILS_SELECT));

    let store_reminder = VersionedStatement::new(write_cl.clone(),
        &REMINDER_COLUMNS.build_insert_query());
    let add_tag = VersionedStatement::new(write_cl,
        &REMINDER_TAG_COLUMNS.build_insert_ignore("(reminder_id, tag_id)"));

    ReminderService {
      get_reminders,
      store_reminder,
      add_tag,
    }
  }

  pub async fn prepare(&self) -> Result<()> {
    self.get_reminders.prepare().await?;
    self.store_reminder.prepare().await?;
    self.add_tag.prepare().await?;
    Ok(())
  }

  pub async fn get_reminders(&self) -> Result<Vec<Reminder>> {
    let rows = self.get_reminders.query(&[]).await?;
    Ok(rows.iter().map(reminder_from_row).collect())
  }

  pub async fn store_in(&self, tx_cl: &RefClient, reminder: &NewReminder) -> Result<Reminder> {
    let row = self.store_reminder.query_one_in(tx_cl, &[
        &reminder.title, &reminder.img_url, &reminder.date,
      ]).await?;
    Ok(Reminder {
      id: row.get(0),
      title: reminder.title.clone(),
      img_url: reminder.img_url.clone(),
      date: reminder.date,
      created_at: row.get(1),
      tags: Vec::new(),
    })
  }

  pub async fn add_tag_in(&self, tx_cl: &RefClient, reminder_id: i32, tag_id: i32) -> Result<()> {
    self.add_tag.execute_in(tx_cl, &[&reminder_id, &tag_id]).await?;
    Ok(())
  }
}
