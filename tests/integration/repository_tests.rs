/*!
 * Glossary and history store on a real database file
 */

use doctran::database::models::{NewTranslation, PageRequest};
use doctran::errors::StoreError;
use doctran::translation::GlossaryEntry;
use doctran::{DatabaseConnection, Repository};

use crate::common::create_temp_dir;

#[tokio::test]
async fn test_repository_afterReopen_shouldKeepGlossaryAndHistory() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("nested").join("doctran.db");

    {
        let repository = Repository::new(DatabaseConnection::new(&path).unwrap());
        repository.add_glossary_term("  API ", "接口").await.unwrap();
        repository.add_glossary_term("GPU", "图形处理器").await.unwrap();
        repository
            .save_translation(NewTranslation {
                original_text: "Hello".to_string(),
                translated_text: "你好".to_string(),
                target_language: "中文".to_string(),
            })
            .await
            .unwrap();
    }

    let repository = Repository::new(DatabaseConnection::new(&path).unwrap());

    let snapshot = repository.glossary_snapshot().await.unwrap();
    assert_eq!(
        snapshot,
        vec![
            GlossaryEntry::new("api", "接口"),
            GlossaryEntry::new("gpu", "图形处理器"),
        ]
    );

    let history = repository.list_translations().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].translated_text, "你好");
    assert!(history[0].timestamp.ends_with('Z'));
}

#[tokio::test]
async fn test_repository_withConcurrentWrites_shouldStoreEveryRow() {
    let dir = create_temp_dir().unwrap();
    let repository = Repository::new(DatabaseConnection::new(dir.path().join("db.sqlite")).unwrap());

    let writes = (0..20).map(|i| {
        let repository = repository.clone();
        tokio::spawn(async move {
            repository
                .add_glossary_term(&format!("term {}", i), "t")
                .await
        })
    });
    for handle in writes.collect::<Vec<_>>() {
        handle.await.unwrap().unwrap();
    }

    let page = repository
        .list_glossary(PageRequest { page: 1, per_page: 200 })
        .await
        .unwrap();
    assert_eq!(page.total, 20);
    assert_eq!(page.terms.len(), 20);
    assert_eq!(page.total_pages, 1);
}

#[tokio::test]
async fn test_repository_updateMissingTerm_shouldNotInsert() {
    let repository = Repository::new_in_memory().unwrap();

    let result = repository.update_glossary_term("ghost", "幽灵").await;

    assert!(matches!(result, Err(StoreError::NotFound(_))));
    assert!(repository.glossary_snapshot().await.unwrap().is_empty());
}
