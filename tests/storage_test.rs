mod common;

use common::{hours_ago, job};
use jobhound::ipc::{JobStreamReader, JobStreamWriter};
use jobhound::job::JobPosting;
use jobhound::sites::SiteId;
use jobhound::storage::{InsertOutcome, JobStore, SqliteJobStore};
use tempfile::TempDir;

async fn open(dir: &TempDir) -> anyhow::Result<SqliteJobStore> {
    Ok(SqliteJobStore::open(&dir.path().join("db").join("jobs.sqlite")).await?)
}

fn posted_at(title: &str, company: &str, time: &str) -> JobPosting {
    JobPosting {
        posted_at: time.to_string(),
        ..job(title, company, &hours_ago(1))
    }
}

#[tokio::test]
async fn redelivered_stream_line_is_stored_once() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = open(&dir).await?;

    let stream = dir.path().join("scraped_jobs.jsonl");
    let writer = JobStreamWriter::new(&stream);
    let posting = job("Backend developer", "Initech", &hours_ago(2));
    writer.append(&posting)?;
    writer.append(&posting)?;

    let mut reader = JobStreamReader::new(&stream);
    let mut outcomes = Vec::new();
    for line in reader.read_new_lines()? {
        outcomes.push(store.insert(&JobStreamReader::parse_line(&line)?).await?);
    }

    assert!(matches!(outcomes[0], InsertOutcome::Inserted { .. }));
    assert_eq!(outcomes[1], InsertOutcome::Duplicate);
    assert_eq!(store.list(None).await?.len(), 1);
    store.close().await;
    Ok(())
}

#[tokio::test]
async fn same_title_at_another_company_is_a_new_posting() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = open(&dir).await?;

    store.insert(&job("Developer", "Initech", "")).await?;
    let other = store.insert(&job("Developer", "Globex", "")).await?;
    let again = store.insert(&job("Tester", "Initech", "")).await?;

    assert!(matches!(other, InsertOutcome::Inserted { .. }));
    assert!(matches!(again, InsertOutcome::Inserted { .. }));
    assert_eq!(store.list(None).await?.len(), 3);
    store.close().await;
    Ok(())
}

#[tokio::test]
async fn list_puts_unseen_first_then_newest() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = open(&dir).await?;

    let mut ids = Vec::new();
    for (title, time) in [
        ("oldest", "2026-01-01 08:00:00"),
        ("newest", "2026-01-01 12:00:00"),
        ("middle", "2026-01-01 10:00:00"),
    ] {
        match store.insert(&posted_at(title, "Initech", time)).await? {
            InsertOutcome::Inserted { id } => ids.push(id),
            InsertOutcome::Duplicate => anyhow::bail!("unexpected duplicate"),
        }
    }
    assert!(store.mark_seen(ids[1]).await?);

    let titles: Vec<_> = store
        .list(None)
        .await?
        .into_iter()
        .map(|j| j.title)
        .collect();
    assert_eq!(titles, ["middle", "oldest", "newest"]);

    let limited = store.list(Some(1)).await?;
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].title, "middle");
    store.close().await;
    Ok(())
}

#[tokio::test]
async fn status_marks_seen_and_can_be_cleared() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = open(&dir).await?;

    let InsertOutcome::Inserted { id } = store.insert(&job("Developer", "Initech", "")).await? else {
        anyhow::bail!("expected insert");
    };

    assert!(store.set_status(id, Some("applied")).await?);
    let stored = &store.list(None).await?[0];
    assert_eq!(stored.status.as_deref(), Some("applied"));
    assert!(!stored.is_new);
    assert_eq!(stored.company, "Initech");

    assert!(store.set_status(id, Some("rejected")).await?);
    assert_eq!(store.list(None).await?[0].status.as_deref(), Some("rejected"));

    assert!(store.set_status(id, None).await?);
    assert_eq!(store.list(None).await?[0].status, None);

    assert!(!store.set_status(id + 100, Some("applied")).await?);
    store.close().await;
    Ok(())
}

#[tokio::test]
async fn delete_removes_posting_and_its_status() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = open(&dir).await?;

    let InsertOutcome::Inserted { id } = store.insert(&job("Developer", "Initech", "")).await? else {
        anyhow::bail!("expected insert");
    };
    store.set_status(id, Some("applied")).await?;

    assert!(store.delete(id).await?);
    assert!(!store.delete(id).await?);
    assert!(!store.mark_seen(id).await?);
    assert!(store.list(None).await?.is_empty());

    // The posting can be collected again afterwards
    assert!(matches!(
        store.insert(&job("Developer", "Initech", "")).await?,
        InsertOutcome::Inserted { .. }
    ));
    store.close().await;
    Ok(())
}

#[tokio::test]
async fn incomplete_posting_is_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let store = open(&dir).await?;

    let mut posting = job("Developer", "Initech", "");
    posting.company = "  ".to_string();
    posting.site = SiteId::Jobmaster;
    assert!(store.insert(&posting).await.is_err());
    store.close().await;
    Ok(())
}
