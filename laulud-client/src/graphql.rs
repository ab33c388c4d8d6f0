//! GraphQL transport.
//!
//! Queries alias camelCase schema fields to the snake_case names used by the
//! domain types, so catalog objects decode with the same serde derives as the
//! REST payloads. Item variants are resolved from `__typename`; anything
//! outside the closed set is a fatal schema mismatch.

use std::time::Duration;

use async_trait::async_trait;
use laulud_core::{
    AlbumSimplified, ApiData, ApiRoute, Artist, CurrentUser, Item, ItemKind, ItemSearchResponse,
    LauludError, LauludResult, SpotifyUri, TagDetails, TagSummary, TaggedItem, Track,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiClientError;
use crate::rest::{build_session_headers, RestClient};
use crate::transport::ApiTransport;

const GRAPHQL_PATH: &str = "/api/graphql";

const IMAGE_FIELDS: &str = "fragment ImageFields on Image { url width height }";

const ARTIST_SIMPLIFIED_FIELDS: &str = r#"
fragment ArtistSimplifiedFields on ArtistSimplified {
  external_urls: externalUrls { spotify } href id name uri
}
"#;

const ALBUM_FIELDS: &str = r#"
fragment AlbumFields on AlbumSimplified {
  album_group: albumGroup album_type: albumType
  artists { ...ArtistSimplifiedFields }
  external_urls: externalUrls { spotify } href id
  images { ...ImageFields } name
  release_date: releaseDate release_date_precision: releaseDatePrecision uri
}
"#;

const TAGGED_ITEM_FIELDS: &str = r#"
fragment TaggedItemFields on TaggedItemNode {
  item {
    __typename
    ... on Track {
      album { ...AlbumFields }
      artists { ...ArtistSimplifiedFields }
      disc_number: discNumber duration_ms: durationMs explicit
      external_urls: externalUrls { spotify } href id name popularity
      preview_url: previewUrl track_number: trackNumber uri
    }
    ... on AlbumSimplified { ...AlbumFields }
    ... on Artist {
      external_urls: externalUrls { spotify } genres href id
      images { ...ImageFields } name popularity uri
    }
  }
  tags { edges { node { tag } } }
}
"#;

/// Everything `...TaggedItemFields` reaches.
const TAGGED_ITEM_FRAGMENTS: &[&str] = &[
    TAGGED_ITEM_FIELDS,
    ALBUM_FIELDS,
    ARTIST_SIMPLIFIED_FIELDS,
    IMAGE_FIELDS,
];

/// An operation and the fragments it spreads. Servers reject documents
/// that define fragments the operation never reaches.
struct Operation {
    text: &'static str,
    fragments: &'static [&'static str],
}

impl Operation {
    fn document(&self) -> String {
        std::iter::once(self.text)
            .chain(self.fragments.iter().copied())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

const CURRENT_USER_QUERY: Operation = Operation {
    text: r#"
query CurrentUser {
  currentUser { id href uri display_name: displayName images { ...ImageFields } }
}
"#,
    fragments: &[IMAGE_FIELDS],
};

const ITEM_QUERY: Operation = Operation {
    text: r#"
query Item($uri: SpotifyUri!) {
  item(uri: $uri) { ...TaggedItemFields }
}
"#,
    fragments: TAGGED_ITEM_FRAGMENTS,
};

const ITEM_SEARCH_QUERY: Operation = Operation {
    text: r#"
query ItemSearch($query: String!) {
  itemSearch(query: $query) {
    tracks { edges { node { ...TaggedItemFields } } }
    albums { edges { node { ...TaggedItemFields } } }
    artists { edges { node { ...TaggedItemFields } } }
  }
}
"#,
    fragments: TAGGED_ITEM_FRAGMENTS,
};

const TAGS_QUERY: Operation = Operation {
    text: r#"
query Tags {
  tags { edges { node { tag items { totalCount } } } }
}
"#,
    fragments: &[],
};

const TAG_QUERY: Operation = Operation {
    text: r#"
query Tag($tag: String!) {
  tag(tag: $tag) { tag items { edges { node { ...TaggedItemFields } } } }
}
"#,
    fragments: TAGGED_ITEM_FRAGMENTS,
};

const ADD_TAG_MUTATION: Operation = Operation {
    text: r#"
mutation AddTag($input: AddTagInput!) {
  addTag(input: $input) { itemEdge { node { ...TaggedItemFields } } }
}
"#,
    fragments: TAGGED_ITEM_FRAGMENTS,
};

const DELETE_TAG_MUTATION: Operation = Operation {
    text: r#"
mutation DeleteTag($input: DeleteTagInput!) {
  deleteTag(input: $input) { itemEdge { node { ...TaggedItemFields } } }
}
"#,
    fragments: TAGGED_ITEM_FRAGMENTS,
};

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Connection<N> {
    edges: Vec<Edge<N>>,
}

#[derive(Debug, Deserialize)]
struct Edge<N> {
    node: N,
}

impl<N> Connection<N> {
    fn into_nodes(self) -> impl Iterator<Item = N> {
        self.edges.into_iter().map(|edge| edge.node)
    }
}

#[derive(Debug, Deserialize)]
struct TagName {
    tag: String,
}

#[derive(Debug, Deserialize)]
struct TaggedItemNode {
    item: Value,
    tags: Connection<TagName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalCount {
    total_count: u32,
}

#[derive(Debug, Deserialize)]
struct TagSummaryNode {
    tag: String,
    items: TotalCount,
}

#[derive(Debug, Deserialize)]
struct TagDetailsNode {
    tag: String,
    items: Connection<TaggedItemNode>,
}

#[derive(Debug, Deserialize)]
struct ItemSearchNode {
    tracks: Connection<TaggedItemNode>,
    albums: Connection<TaggedItemNode>,
    artists: Connection<TaggedItemNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentUserData {
    current_user: CurrentUser,
}

#[derive(Debug, Deserialize)]
struct ItemData {
    item: Option<TaggedItemNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemSearchData {
    item_search: ItemSearchNode,
}

#[derive(Debug, Deserialize)]
struct TagsData {
    tags: Connection<TagSummaryNode>,
}

#[derive(Debug, Deserialize)]
struct TagData {
    tag: Option<TagDetailsNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagPayload {
    item_edge: Option<Edge<TaggedItemNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddTagData {
    add_tag: TagPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteTagData {
    delete_tag: TagPayload,
}

/// Decode an item object by its `__typename`.
pub fn decode_item(value: Value) -> LauludResult<Item> {
    let typename = value
        .get("__typename")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiClientError::InvalidResponse("item without __typename".to_string()))?;
    let item = match ItemKind::from_typename(typename)? {
        ItemKind::Track => Item::Track(serde_json::from_value::<Track>(value).map_err(ApiClientError::from)?),
        ItemKind::Album => {
            Item::Album(serde_json::from_value::<AlbumSimplified>(value).map_err(ApiClientError::from)?)
        }
        ItemKind::Artist => {
            Item::Artist(serde_json::from_value::<Artist>(value).map_err(ApiClientError::from)?)
        }
    };
    Ok(item)
}

impl TaggedItemNode {
    fn into_tagged_item(self) -> LauludResult<TaggedItem> {
        let item = decode_item(self.item)?;
        let tags = self.tags.into_nodes().map(|node| node.tag).collect();
        Ok(TaggedItem::new(item, tags))
    }
}

fn collect_items(connection: Connection<TaggedItemNode>) -> LauludResult<Vec<TaggedItem>> {
    connection
        .into_nodes()
        .map(TaggedItemNode::into_tagged_item)
        .collect()
}

// ============================================================================
// CLIENT
// ============================================================================

/// Speaks GraphQL for data and mutations; auth endpoints are plain HTTP and
/// go through the REST client.
#[derive(Clone)]
pub struct GraphqlClient {
    client: reqwest::Client,
    rest: RestClient,
    endpoint: String,
    timeout_ms: u64,
}

impl GraphqlClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .default_headers(build_session_headers(config.session_cookie.as_deref())?)
            .build()?;
        Ok(Self {
            client,
            rest: RestClient::new(config)?,
            endpoint: format!("{}{}", config.base_url(), GRAPHQL_PATH),
            timeout_ms: config.request_timeout_ms,
        })
    }

    /// POST `{query, variables}` and unwrap `data`. A non-empty `errors`
    /// array fails the whole request.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &Operation,
        variables: Value,
    ) -> Result<T, ApiClientError> {
        debug!(endpoint = %self.endpoint, "Sending GraphQL request");
        let body = json!({
            "query": operation.document(),
            "variables": variables,
        });
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ApiClientError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    ApiClientError::Http(err)
                }
            })?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiClientError::Status {
                status: status.as_u16(),
                body: text.trim().to_string(),
            });
        }
        let response: GraphqlResponse<T> = serde_json::from_str(&text)?;
        if !response.errors.is_empty() {
            return Err(ApiClientError::Graphql(
                response.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        response
            .data
            .ok_or_else(|| ApiClientError::InvalidResponse("response without data".to_string()))
    }

    async fn run<T: DeserializeOwned>(
        &self,
        operation: &Operation,
        variables: Value,
        route: &str,
    ) -> LauludResult<T> {
        self.execute(operation, variables)
            .await
            .map_err(|err| err.into_laulud(route))
    }

    async fn fetch_route(&self, route: &ApiRoute) -> LauludResult<ApiData> {
        let path = route.path();
        let not_found = || LauludError::NotFound {
            route: path.clone(),
        };
        let data = match route {
            ApiRoute::CurrentUser => {
                let data: CurrentUserData = self.run(&CURRENT_USER_QUERY, json!({}), &path).await?;
                ApiData::CurrentUser(data.current_user)
            }
            ApiRoute::Item(uri) => {
                let data: ItemData = self
                    .run(&ITEM_QUERY, json!({ "uri": uri.to_string() }), &path)
                    .await?;
                let node = data.item.ok_or_else(not_found)?;
                ApiData::Item(node.into_tagged_item()?)
            }
            ApiRoute::ItemSearch(query) => {
                let data: ItemSearchData = self
                    .run(&ITEM_SEARCH_QUERY, json!({ "query": query }), &path)
                    .await?;
                let search = data.item_search;
                ApiData::ItemSearch(ItemSearchResponse {
                    tracks: collect_items(search.tracks)?,
                    albums: collect_items(search.albums)?,
                    artists: collect_items(search.artists)?,
                })
            }
            ApiRoute::Tags => {
                let data: TagsData = self.run(&TAGS_QUERY, json!({}), &path).await?;
                let mut summaries: Vec<TagSummary> = data
                    .tags
                    .into_nodes()
                    .map(|node| TagSummary {
                        tag: node.tag,
                        num_items: node.items.total_count,
                    })
                    .collect();
                summaries.sort_by(|a, b| b.num_items.cmp(&a.num_items));
                ApiData::Tags(summaries)
            }
            ApiRoute::Tag(tag) => {
                let data: TagData = self.run(&TAG_QUERY, json!({ "tag": tag }), &path).await?;
                let node = data.tag.ok_or_else(not_found)?;
                ApiData::Tag(TagDetails {
                    tag: node.tag,
                    items: collect_items(node.items)?,
                })
            }
        };
        Ok(data)
    }
}

#[async_trait]
impl ApiTransport for GraphqlClient {
    async fn query(&self, route: &ApiRoute) -> LauludResult<ApiData> {
        self.fetch_route(route).await
    }

    async fn add_tag(&self, uri: &SpotifyUri, tag: &str) -> LauludResult<TaggedItem> {
        let variables = json!({ "input": { "itemUri": uri.to_string(), "tag": tag } });
        let data: AddTagData = self.run(&ADD_TAG_MUTATION, variables, GRAPHQL_PATH).await?;
        let edge = data.add_tag.item_edge.ok_or_else(|| LauludError::NotFound {
            route: uri.to_string(),
        })?;
        edge.node.into_tagged_item()
    }

    async fn delete_tag(&self, uri: &SpotifyUri, tag: &str) -> LauludResult<TaggedItem> {
        let variables = json!({ "input": { "itemUri": uri.to_string(), "tag": tag } });
        let data: DeleteTagData = self.run(&DELETE_TAG_MUTATION, variables, GRAPHQL_PATH).await?;
        let edge = data.delete_tag.item_edge.ok_or_else(|| LauludError::NotFound {
            route: uri.to_string(),
        })?;
        edge.node.into_tagged_item()
    }

    async fn auth_check(&self) -> LauludResult<bool> {
        self.rest.auth_check().await
    }

    async fn logout(&self) -> LauludResult<()> {
        self.rest.logout().await
    }

    fn login_url(&self, next: &str) -> String {
        self.rest.login_url(next)
    }
}
