use super::OpenStore;

/// Prints `true` or `false` and reports the answer for the exit code.
pub async fn run(store: &OpenStore, key: &str) -> bool {
    let found = store.storage.exists(key).await;
    println!("{}", found);
    found
}
