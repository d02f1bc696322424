use script_store::{FileScriptStore, ScriptStore, StoreError};
use webminer_core_types::{Command, QueryDescriptor, Script, Step, StepElement};

fn script(name: &str) -> Script {
    Script::new(name, "https://shop.example/").with_step(Step::new(
        StepElement::new(vec![
            QueryDescriptor::css("a.product"),
            QueryDescriptor::text("Details"),
        ]),
        Command::open_link(Some("scrape-product".into())),
    ))
}

#[tokio::test]
async fn test_scripts_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scripts.json");

    let store = FileScriptStore::new(&path);
    store.save(script("browse"), None).await.unwrap();
    drop(store);

    let reopened = FileScriptStore::new(&path);
    assert_eq!(reopened.list_names().await.unwrap(), vec!["browse".to_string()]);
    assert_eq!(reopened.get("browse").await.unwrap(), Some(script("browse")));
}

#[tokio::test]
async fn test_rename_onto_taken_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileScriptStore::new(dir.path().join("scripts.json"));
    store.save(script("A"), None).await.unwrap();
    store.save(script("B"), None).await.unwrap();

    let err = store.save(script("A"), Some("B")).await.unwrap_err();
    assert!(matches!(err, StoreError::NameConflict(name) if name == "A"));
    assert_eq!(
        store.list_names().await.unwrap(),
        vec!["A".to_string(), "B".to_string()]
    );

    store.save(script("A"), Some("A")).await.unwrap();
}

#[tokio::test]
async fn test_rename_replaces_old_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileScriptStore::new(dir.path().join("scripts.json"));
    store.save(script("draft"), None).await.unwrap();
    store.save(script("final"), Some("draft")).await.unwrap();

    assert_eq!(store.list_names().await.unwrap(), vec!["final".to_string()]);
    assert!(store.remove("final").await.unwrap());
    assert!(store.list_names().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stored_json_keeps_wire_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scripts.json");
    let store = FileScriptStore::new(&path);
    store.save(script("browse"), None).await.unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let selectors = &raw["browse"]["steps"][0]["element"]["selectors"];
    assert_eq!(selectors[0]["searchAPI"], "querySelector");
    assert_eq!(selectors[1]["searchAPI"], "getElementsByText");
    assert_eq!(raw["browse"]["steps"][0]["command"]["commandType"], "Open Link");
}
