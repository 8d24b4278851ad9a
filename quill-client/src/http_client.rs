use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::PostApi;
use crate::error::ApiError;
use crate::model::{ImageFile, NewPost, Patch, Post, PostPatch};

#[derive(Clone)]
pub struct HttpPostApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpPostApi {
    pub fn new(endpoint: &str, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: endpoint.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn patch_body(patch: &PostPatch) -> Value {
        let mut body = Map::new();
        if let Some(title) = &patch.title {
            body.insert("title".into(), json!(title));
        }
        if let Some(content) = &patch.content {
            body.insert("content".into(), json!(content));
        }
        if let Some(published) = patch.published {
            body.insert("published".into(), json!(published));
        }
        // Keep leaves the key off the wire so the server preserves the
        // stored value; Clear sends an explicit null.
        insert_patch(&mut body, "videoUrl", &patch.video_url);
        insert_patch(&mut body, "imageUrl", &patch.image_url);
        Value::Object(body)
    }
}

fn insert_patch(body: &mut Map<String, Value>, key: &str, field: &Patch<String>) {
    match field {
        Patch::Keep => {}
        Patch::Clear => {
            body.insert(key.into(), Value::Null);
        }
        Patch::Set(value) => {
            body.insert(key.into(), json!(value));
        }
    }
}

#[async_trait]
impl PostApi for HttpPostApi {
    async fn list_posts(&self, query: Option<&str>) -> Result<Vec<Post>, ApiError> {
        let mut req = self.client.get(format!("{}/api/posts", self.base_url));
        if let Some(q) = query {
            req = req.query(&[("q", q)]);
        }
        let resp = req.send().await?;

        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(ApiError::from_http_response(resp).await)
        }
    }

    async fn get_post(&self, id: Uuid) -> Result<Post, ApiError> {
        let req = self.client.get(format!("{}/api/posts/{}", self.base_url, id));
        let resp = self.authorize(req).send().await?;

        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(ApiError::from_http_response(resp).await)
        }
    }

    async fn create_post(&self, new: &NewPost) -> Result<Post, ApiError> {
        let req = self.client.post(format!("{}/api/posts", self.base_url));
        let resp = self
            .authorize(req)
            .json(&json!({
                "title": new.title,
                "content": new.content,
                "published": new.published,
                "videoUrl": new.video_url,
                "imageUrl": new.image_url,
            }))
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(ApiError::from_http_response(resp).await)
        }
    }

    async fn update_post(&self, id: Uuid, patch: &PostPatch) -> Result<Post, ApiError> {
        let req = self.client.put(format!("{}/api/posts/{}", self.base_url, id));
        let resp = self
            .authorize(req)
            .json(&Self::patch_body(patch))
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(ApiError::from_http_response(resp).await)
        }
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), ApiError> {
        let req = self
            .client
            .delete(format!("{}/api/posts/{}", self.base_url, id));
        let resp = self.authorize(req).send().await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ApiError::from_http_response(resp).await)
        }
    }

    async fn upload_image(&self, file: &ImageFile) -> Result<String, ApiError> {
        let req = self
            .client
            .post(format!("{}/api/uploads", self.base_url))
            .query(&[("filename", file.name.as_str())])
            .header(reqwest::header::CONTENT_TYPE, &file.content_type)
            .body(file.bytes.clone());
        let resp = self.authorize(req).send().await?;

        if resp.status().is_success() {
            #[derive(serde::Deserialize)]
            #[serde(rename_all = "camelCase")]
            struct Uploaded {
                image_url: String,
            }
            let uploaded: Uploaded = resp.json().await?;
            Ok(uploaded.image_url)
        } else {
            Err(ApiError::from_http_response(resp).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_body_omits_kept_keys_and_nulls_cleared_ones() {
        let patch = PostPatch {
            title: Some("T".into()),
            content: None,
            published: Some(false),
            video_url: Patch::Clear,
            image_url: Patch::Keep,
        };
        let body = HttpPostApi::patch_body(&patch);
        let obj = body.as_object().unwrap();
        assert_eq!(obj["title"], "T");
        assert!(!obj.contains_key("content"));
        assert_eq!(obj["published"], false);
        assert_eq!(obj["videoUrl"], Value::Null);
        assert!(!obj.contains_key("imageUrl"));
    }

    #[test]
    fn patch_body_sends_set_values() {
        let patch = PostPatch {
            image_url: Patch::Set("https://cdn.test/a.png".into()),
            ..PostPatch::default()
        };
        let body = HttpPostApi::patch_body(&patch);
        assert_eq!(body["imageUrl"], "https://cdn.test/a.png");
    }
}
