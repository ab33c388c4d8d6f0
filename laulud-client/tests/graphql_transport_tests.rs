//! GraphQL transport against canned responses. The fake endpoint validates
//! every document before answering, like the real server does.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_graphql_parser::parse_query;
use async_graphql_parser::types::{DocumentOperations, ExecutableDocument, Selection, SelectionSet};
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use laulud_client::{ApiTransport, ClientConfig, GraphqlClient, TransportKind};
use laulud_core::{ApiRoute, ItemKind, LauludError, SpotifyUri, TransportError};
use laulud_test_utils::assertions::{assert_fatal, assert_not_found};
use laulud_test_utils::fixtures;
use laulud_test_utils::server::{spawn_router, FakeApi};
use serde_json::{json, Value};

#[derive(Clone)]
struct Canned {
    response: Value,
    requests: Arc<Mutex<Vec<Value>>>,
}

fn collect_spreads(set: &SelectionSet, spreads: &mut Vec<String>) {
    for selection in &set.items {
        match &selection.node {
            Selection::Field(field) => collect_spreads(&field.node.selection_set.node, spreads),
            Selection::FragmentSpread(spread) => {
                spreads.push(spread.node.fragment_name.node.as_str().to_string())
            }
            Selection::InlineFragment(inline) => {
                collect_spreads(&inline.node.selection_set.node, spreads)
            }
        }
    }
}

/// Fragments reached from the operations, and the defined ones that are not.
fn fragment_usage(document: &ExecutableDocument) -> (HashSet<String>, Vec<String>) {
    let mut pending = Vec::new();
    match &document.operations {
        DocumentOperations::Single(operation) => {
            collect_spreads(&operation.node.selection_set.node, &mut pending)
        }
        DocumentOperations::Multiple(operations) => {
            for operation in operations.values() {
                collect_spreads(&operation.node.selection_set.node, &mut pending);
            }
        }
    }
    let mut reached = HashSet::new();
    while let Some(name) = pending.pop() {
        if !reached.insert(name.clone()) {
            continue;
        }
        let definition = document
            .fragments
            .iter()
            .find(|(defined, _)| defined.as_str() == name);
        if let Some((_, definition)) = definition {
            collect_spreads(&definition.node.selection_set.node, &mut pending);
        }
    }
    let mut unused: Vec<String> = document
        .fragments
        .keys()
        .map(|name| name.as_str().to_string())
        .filter(|name| !reached.contains(name))
        .collect();
    unused.sort();
    (reached, unused)
}

/// Validation failures a GraphQL server reports for `query`.
fn document_errors(query: &str) -> Vec<String> {
    let document = match parse_query(query) {
        Ok(document) => document,
        Err(err) => return vec![format!("Syntax error: {}", err)],
    };
    let (reached, unused) = fragment_usage(&document);
    let defined: HashSet<String> = document
        .fragments
        .keys()
        .map(|name| name.as_str().to_string())
        .collect();
    let mut errors: Vec<String> = unused
        .into_iter()
        .map(|name| format!("Fragment \"{}\" is never used", name))
        .collect();
    let mut undefined: Vec<&String> = reached.difference(&defined).collect();
    undefined.sort();
    errors.extend(
        undefined
            .into_iter()
            .map(|name| format!("Unknown fragment \"{}\"", name)),
    );
    errors
}

async fn respond(State(canned): State<Canned>, Json(body): Json<Value>) -> Json<Value> {
    let errors = document_errors(body["query"].as_str().unwrap_or_default());
    canned.requests.lock().unwrap().push(body);
    if !errors.is_empty() {
        let errors: Vec<Value> = errors.iter().map(|m| json!({"message": m})).collect();
        return Json(json!({"data": null, "errors": errors}));
    }
    Json(canned.response)
}

async fn serve(response: Value) -> (GraphqlClient, FakeApi, Arc<Mutex<Vec<Value>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/api/graphql", post(respond))
        .with_state(Canned {
            response,
            requests: requests.clone(),
        });
    let api = spawn_router(router).await;
    let config = ClientConfig::new(api.base_url.clone()).with_transport(TransportKind::Graphql);
    let client = GraphqlClient::new(&config).unwrap();
    (client, api, requests)
}

fn track_node(tags: &[&str]) -> Value {
    let mut item = serde_json::to_value(fixtures::track("123", "Myth")).unwrap();
    item["__typename"] = json!("Track");
    let edges: Vec<Value> = tags.iter().map(|t| json!({"node": {"tag": t}})).collect();
    json!({"item": item, "tags": {"edges": edges}})
}

#[tokio::test]
async fn test_tags_sorted_by_count() {
    let (client, _api, requests) = serve(json!({"data": {"tags": {"edges": [
        {"node": {"tag": "driving", "items": {"totalCount": 1}}},
        {"node": {"tag": "chill", "items": {"totalCount": 3}}}
    ]}}}))
    .await;

    let data = client.query(&ApiRoute::Tags).await.unwrap();

    let tags = data.as_tags().unwrap();
    assert_eq!(tags[0].tag, "chill");
    assert_eq!(tags[0].num_items, 3);
    let sent = &requests.lock().unwrap()[0];
    assert!(sent["query"].as_str().unwrap().contains("query Tags"));
}

#[tokio::test]
async fn test_item_decoded_by_typename() {
    let (client, _api, requests) = serve(json!({"data": {"item": track_node(&["chill"])}})).await;
    let uri: SpotifyUri = "spotify:track:123".parse().unwrap();

    let data = client.query(&ApiRoute::Item(uri)).await.unwrap();

    let item = data.as_item().unwrap();
    assert_eq!(item.item.kind(), ItemKind::Track);
    assert_eq!(item.tags, vec!["chill"]);
    let sent = &requests.lock().unwrap()[0];
    assert_eq!(sent["variables"]["uri"], "spotify:track:123");
}

#[tokio::test]
async fn test_null_item_is_not_found() {
    let (client, _api, _) = serve(json!({"data": {"item": null}})).await;
    let uri: SpotifyUri = "spotify:track:123".parse().unwrap();

    assert_not_found(&client.query(&ApiRoute::Item(uri)).await);
}

#[tokio::test]
async fn test_errors_array_fails_request() {
    let (client, _api, _) = serve(json!({
        "data": null,
        "errors": [{"message": "Cannot query field \"tagz\""}]
    }))
    .await;

    let err = client.query(&ApiRoute::Tags).await.unwrap_err();

    assert_eq!(
        err,
        LauludError::Transport(TransportError::Graphql {
            messages: vec!["Cannot query field \"tagz\"".to_string()]
        })
    );
}

#[tokio::test]
async fn test_unknown_typename_is_fatal() {
    let mut node = track_node(&[]);
    node["item"]["__typename"] = json!("Episode");
    let (client, _api, _) = serve(json!({"data": {"item": node}})).await;
    let uri: SpotifyUri = "spotify:track:123".parse().unwrap();

    assert_fatal(&client.query(&ApiRoute::Item(uri)).await);
}

#[tokio::test]
async fn test_search_collects_connections() {
    let (client, _api, _) = serve(json!({"data": {"itemSearch": {
        "tracks": {"edges": [{"node": track_node(&["chill"])}]},
        "albums": {"edges": []},
        "artists": {"edges": []}
    }}}))
    .await;

    let data = client
        .query(&ApiRoute::ItemSearch("myth".to_string()))
        .await
        .unwrap();

    let results = data.as_search().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results.items(ItemKind::Track)[0].tags, vec!["chill"]);
}

#[tokio::test]
async fn test_add_tag_mutation_input() {
    let (client, _api, requests) = serve(json!({"data": {"addTag": {
        "itemEdge": {"node": track_node(&["chill", "driving"])}
    }}}))
    .await;
    let uri: SpotifyUri = "spotify:track:123".parse().unwrap();

    let item = client.add_tag(&uri, "driving").await.unwrap();

    assert_eq!(item.tags, vec!["chill", "driving"]);
    let sent = &requests.lock().unwrap()[0];
    assert!(sent["query"].as_str().unwrap().contains("mutation AddTag"));
    assert_eq!(
        sent["variables"]["input"],
        json!({"itemUri": "spotify:track:123", "tag": "driving"})
    );
}

#[tokio::test]
async fn test_delete_tag_without_item_edge() {
    let (client, _api, _) = serve(json!({"data": {"deleteTag": {"itemEdge": null}}})).await;
    let uri: SpotifyUri = "spotify:track:123".parse().unwrap();

    assert_not_found(&client.delete_tag(&uri, "chill").await);
}

#[test]
fn test_validator_flags_unused_and_unknown_fragments() {
    let unused = "query Q { a }\nfragment F on T { b }";
    assert_eq!(document_errors(unused), vec!["Fragment \"F\" is never used"]);
    let unknown = "query Q { a { ...G } }";
    assert_eq!(document_errors(unknown), vec!["Unknown fragment \"G\""]);
    let nested = "query Q { a { ...F } }\nfragment F on T { b { ...G } }\nfragment G on U { c }";
    assert!(document_errors(nested).is_empty());
}

#[tokio::test]
async fn test_every_operation_is_a_valid_document() {
    let (client, _api, requests) = serve(json!({"data": null, "errors": [{"message": "canned"}]})).await;
    let uri: SpotifyUri = "spotify:track:123".parse().unwrap();

    for route in [
        ApiRoute::CurrentUser,
        ApiRoute::Item(uri.clone()),
        ApiRoute::ItemSearch("myth".to_string()),
        ApiRoute::Tags,
        ApiRoute::Tag("chill".to_string()),
    ] {
        let _ = client.query(&route).await;
    }
    let _ = client.add_tag(&uri, "driving").await;
    let _ = client.delete_tag(&uri, "chill").await;

    let sent = requests.lock().unwrap();
    assert_eq!(sent.len(), 7);
    for body in sent.iter() {
        let query = body["query"].as_str().unwrap();
        assert_eq!(document_errors(query), Vec::<String>::new(), "{}", query);
    }
}

#[tokio::test]
async fn test_current_user_passes_validation() {
    let (client, _api, _) = serve(json!({"data": {"currentUser": {
        "id": "lucas", "href": "https://api.spotify.com/v1/users/lucas",
        "uri": "spotify:user:lucas", "display_name": "Lucas", "images": []
    }}}))
    .await;

    let data = client.query(&ApiRoute::CurrentUser).await.unwrap();

    assert_eq!(data.as_current_user().unwrap().label(), "Lucas");
}
