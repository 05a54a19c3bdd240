use anyhow::Result;
use carapace::core::entity::{Entity, Lifecycle};
use carapace::core::executor::SqliteExecutor;
use carapace::core::filter::Filter;
use carapace::core::mapping::{lifecycle_mappings, FieldMapping, Persistable};
use carapace::core::paginator::{CursorEnd, Paginator, SortOrder};
use carapace::core::persister::Persister;
use carapace::core::schema;
use carapace::impl_entity_via_lifecycle;
use serde_json::{json, Value as JsonValue};
use tempfile::TempDir;

#[derive(Debug, Default, Clone)]
struct Article {
    lifecycle: Lifecycle,
    title: String,
    published: bool,
}

impl_entity_via_lifecycle!(Article, lifecycle);

impl Persistable for Article {
    fn table() -> &'static str {
        "articles"
    }

    fn field_mappings() -> Vec<FieldMapping<Self>> {
        let mut maps = lifecycle_mappings::<Self>();
        maps.push(FieldMapping::new(
            "title",
            |e: &Self| JsonValue::String(e.title.clone()),
            |e: &mut Self, v| {
                e.title = v.as_str().unwrap_or_default().to_string();
                Ok(())
            },
        ));
        maps.push(
            FieldMapping::new(
                "published",
                |e: &Self| json!(e.published),
                |e: &mut Self, v| {
                    e.published = v.as_i64().unwrap_or_default() != 0;
                    Ok(())
                },
            )
            .sql_type("INTEGER"),
        );
        maps
    }
}

fn seeded(tmp: &TempDir, titles: &[&str]) -> Result<Persister<SqliteExecutor>> {
    let executor = SqliteExecutor::open(&tmp.path().join("pages.db"))?;
    schema::initialize::<Article>(&executor)?;
    let persister = Persister::new(executor);
    for title in titles {
        let mut article = Article {
            title: title.to_string(),
            published: true,
            ..Default::default()
        };
        persister.insert(&mut article)?;
    }
    Ok(persister)
}

fn titles(page: &[Article]) -> Vec<&str> {
    page.iter().map(|a| a.title.as_str()).collect()
}

fn seed_article(persister: &Persister<SqliteExecutor>, title: &str) -> Result<Article> {
    let mut article = Article {
        title: title.to_string(),
        published: true,
        ..Default::default()
    };
    persister.insert(&mut article)?;
    Ok(article)
}

#[test]
fn first_page_follows_requested_order() -> Result<()> {
    let tmp = TempDir::new()?;
    let persister = seeded(&tmp, &["a", "b", "c", "d", "e"])?;

    let page: Vec<Article> =
        persister.list(&[], Some(&Paginator::first_page(2, SortOrder::Asc)), false)?;
    assert_eq!(titles(&page), vec!["a", "b"]);

    let page: Vec<Article> =
        persister.list(&[], Some(&Paginator::first_page(2, SortOrder::Desc)), false)?;
    assert_eq!(titles(&page), vec!["e", "d"]);
    Ok(())
}

#[test]
fn forward_paging_from_last_cursor_walks_the_table() -> Result<()> {
    let tmp = TempDir::new()?;
    let persister = seeded(&tmp, &["a", "b", "c", "d", "e"])?;

    let first: Vec<Article> =
        persister.list(&[], Some(&Paginator::first_page(2, SortOrder::Asc)), false)?;
    let cursor = first.last().unwrap().identity().unwrap().to_string();

    let second: Vec<Article> = persister.list(
        &[],
        Some(&Paginator::new(2, Some(cursor), CursorEnd::Last, SortOrder::Asc)),
        false,
    )?;
    assert_eq!(titles(&second), vec!["c", "d"]);

    let cursor = second.last().unwrap().identity().unwrap().to_string();
    let third: Vec<Article> = persister.list(
        &[],
        Some(&Paginator::new(2, Some(cursor), CursorEnd::Last, SortOrder::Asc)),
        false,
    )?;
    assert_eq!(titles(&third), vec!["e"]);
    Ok(())
}

#[test]
fn backward_paging_from_first_cursor_restores_final_order() -> Result<()> {
    let tmp = TempDir::new()?;
    let persister = seeded(&tmp, &["a", "b", "c", "d", "e"])?;

    // caller holds ["c", "d"]; paging back from its first row yields ["a", "b"]
    let all: Vec<Article> =
        persister.list(&[], Some(&Paginator::first_page(5, SortOrder::Asc)), false)?;
    let cursor = all[2].identity().unwrap().to_string();

    let previous: Vec<Article> = persister.list(
        &[],
        Some(&Paginator::new(2, Some(cursor), CursorEnd::First, SortOrder::Asc)),
        false,
    )?;
    assert_eq!(titles(&previous), vec!["a", "b"]);
    Ok(())
}

#[test]
fn descending_paging_with_both_cursor_ends() -> Result<()> {
    let tmp = TempDir::new()?;
    let persister = seeded(&tmp, &["a", "b", "c", "d", "e"])?;

    let first: Vec<Article> =
        persister.list(&[], Some(&Paginator::first_page(2, SortOrder::Desc)), false)?;
    assert_eq!(titles(&first), vec!["e", "d"]);

    let cursor = first.last().unwrap().identity().unwrap().to_string();
    let next: Vec<Article> = persister.list(
        &[],
        Some(&Paginator::new(2, Some(cursor), CursorEnd::Last, SortOrder::Desc)),
        false,
    )?;
    assert_eq!(titles(&next), vec!["c", "b"]);

    let cursor = next.first().unwrap().identity().unwrap().to_string();
    let back: Vec<Article> = persister.list(
        &[],
        Some(&Paginator::new(2, Some(cursor), CursorEnd::First, SortOrder::Desc)),
        false,
    )?;
    assert_eq!(titles(&back), vec!["e", "d"]);
    Ok(())
}

#[test]
fn pages_stay_stable_under_concurrent_inserts() -> Result<()> {
    let tmp = TempDir::new()?;
    let persister = seeded(&tmp, &["a", "b", "c"])?;

    let first: Vec<Article> =
        persister.list(&[], Some(&Paginator::first_page(2, SortOrder::Asc)), false)?;
    assert_eq!(titles(&first), vec!["a", "b"]);
    let cursor = first.last().unwrap().identity().unwrap().to_string();

    // churn between page fetches must not shift the next page: new rows land
    // and an already-seen row disappears
    seed_article(&persister, "d")?;
    seed_article(&persister, "e")?;
    let mut a = first[0].clone();
    persister.delete(&mut a)?;

    let second: Vec<Article> = persister.list(
        &[],
        Some(&Paginator::new(2, Some(cursor), CursorEnd::Last, SortOrder::Asc)),
        false,
    )?;
    assert_eq!(titles(&second), vec!["c", "d"]);
    Ok(())
}

#[test]
fn filters_compose_with_pagination() -> Result<()> {
    let tmp = TempDir::new()?;
    let persister = seeded(&tmp, &["a", "b"])?;
    let mut unpublished = Article {
        title: "draft".to_string(),
        published: false,
        ..Default::default()
    };
    persister.insert(&mut unpublished)?;
    seed_article(&persister, "c")?;

    let page: Vec<Article> = persister.list(
        &[Filter::new(Some("published"), Some(json!(true)))],
        Some(&Paginator::first_page(10, SortOrder::Asc)),
        false,
    )?;
    assert_eq!(titles(&page), vec!["a", "b", "c"]);
    Ok(())
}

#[test]
fn noop_filters_vanish_and_soft_deleted_rows_stay_out() -> Result<()> {
    let tmp = TempDir::new()?;
    let persister = seeded(&tmp, &["a", "b", "c"])?;

    let mut b: Article = {
        let page: Vec<Article> =
            persister.list(&[], Some(&Paginator::first_page(3, SortOrder::Asc)), false)?;
        page[1].clone()
    };
    persister.delete(&mut b)?;

    let visible: Vec<Article> = persister.list(
        &[
            Filter::new(None, Some(json!("ignored"))),
            Filter::new(Some("title"), None),
        ],
        None,
        false,
    )?;
    assert_eq!(titles(&visible), vec!["a", "c"]);

    let with_deleted: Vec<Article> = persister.list(&[], None, true)?;
    assert_eq!(with_deleted.len(), 3);
    Ok(())
}

#[test]
fn unknown_filter_field_is_rejected_before_reaching_sql() -> Result<()> {
    let tmp = TempDir::new()?;
    let persister = seeded(&tmp, &["a"])?;

    let err = persister
        .list::<Article>(
            &[Filter::new(Some("nope; DROP TABLE articles"), Some(json!(1)))],
            None,
            false,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        carapace::core::error::StorageError::Validation(_)
    ));
    Ok(())
}
