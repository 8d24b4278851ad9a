//! Authoring form controller: the state machine behind composing or
//! editing a post, including the two-phase image attachment (select
//! locally, then commit to object storage) and submission gating.
//!
//! Transitions are synchronous and free of IO; the async drivers at the
//! bottom wrap them around `PostApi` calls. Every client-side check here
//! is a UX convenience only — the server re-validates everything.

use thiserror::Error;
use uuid::Uuid;

use crate::PostApi;
use crate::error::ApiError;
use crate::model::{ImageFile, NewPost, Patch, Post, PostPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Uploading,
    Uploaded,
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub enum SubmitTarget {
    Create,
    Update(Uuid),
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("no image selected")]
    NoImageSelected,
    #[error("an image upload is already in progress")]
    UploadInFlight,
    #[error("the last image upload failed; retry it or clear the image")]
    UploadFailed,
    #[error("the selected image has not been uploaded; upload it or clear it first")]
    ImageNotUploaded,
    #[error("a submission is already in progress")]
    SubmitInFlight,
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct PostForm {
    title: String,
    content: String,
    published: bool,
    video_url: String,
    image_file: Option<ImageFile>,
    image_url: Option<String>,
    // The image reference the editing session started from; a failed
    // re-upload falls back to it rather than destroying it.
    initial_image_url: Option<String>,
    upload: UploadStatus,
    submitting: bool,
}

impl PostForm {
    /// A blank compose form. Posts publish by default.
    pub fn new() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            published: true,
            video_url: String::new(),
            image_file: None,
            image_url: None,
            initial_image_url: None,
            upload: UploadStatus::Idle,
            submitting: false,
        }
    }

    /// An edit form prefilled from an existing post.
    pub fn edit(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            content: post.content.clone(),
            published: post.published,
            video_url: post.video_url.clone().unwrap_or_default(),
            image_file: None,
            image_url: post.image_url.clone(),
            initial_image_url: post.image_url.clone(),
            upload: UploadStatus::Idle,
            submitting: false,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_published(&mut self, published: bool) {
        self.published = published;
    }

    pub fn set_video_url(&mut self, video_url: impl Into<String>) {
        self.video_url = video_url.into();
    }

    pub fn upload_status(&self) -> UploadStatus {
        self.upload
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Attaches a local file. Selection never uploads implicitly, and it
    /// invalidates whatever durable URL was showing until the new file is
    /// either uploaded or cleared.
    pub fn select_image(&mut self, file: ImageFile) {
        self.image_file = Some(file);
        self.image_url = None;
        self.upload = UploadStatus::Idle;
    }

    /// Drops both the local selection and the durable reference. The only
    /// path that can null out a previously saved image.
    pub fn clear_image(&mut self) {
        self.image_file = None;
        self.image_url = None;
        self.upload = UploadStatus::Idle;
    }

    /// Marks the upload in flight and yields the file to send.
    pub fn begin_upload(&mut self) -> Result<ImageFile, FormError> {
        if self.upload == UploadStatus::Uploading {
            return Err(FormError::UploadInFlight);
        }
        if self.submitting {
            return Err(FormError::SubmitInFlight);
        }
        let Some(file) = &self.image_file else {
            return Err(FormError::NoImageSelected);
        };
        self.upload = UploadStatus::Uploading;
        Ok(file.clone())
    }

    /// Records the upload outcome. Success commits the durable URL and
    /// consumes the local selection; failure reverts to the image the
    /// session started with so retrying is safe.
    pub fn finish_upload(&mut self, outcome: Result<String, ApiError>) -> Result<String, FormError> {
        match outcome {
            Ok(url) => {
                self.image_url = Some(url.clone());
                self.image_file = None;
                self.upload = UploadStatus::Uploaded;
                Ok(url)
            }
            Err(e) => {
                self.upload = UploadStatus::Failed;
                self.image_url = self.initial_image_url.clone();
                Err(e.into())
            }
        }
    }

    /// Submission gate. Every rejection means no network call is made.
    pub fn check_submit(&self) -> Result<(), FormError> {
        if self.submitting {
            return Err(FormError::SubmitInFlight);
        }
        match self.upload {
            UploadStatus::Uploading => return Err(FormError::UploadInFlight),
            UploadStatus::Failed => return Err(FormError::UploadFailed),
            UploadStatus::Idle | UploadStatus::Uploaded => {}
        }
        // A selected-but-unuploaded file must be neither dropped nor
        // silently submitted as absent.
        if self.image_file.is_some() && self.image_url.is_none() {
            return Err(FormError::ImageNotUploaded);
        }
        if self.title.trim().is_empty() {
            return Err(FormError::EmptyField("title"));
        }
        if self.content.trim().is_empty() {
            return Err(FormError::EmptyField("content"));
        }
        Ok(())
    }

    pub fn new_post(&self) -> NewPost {
        NewPost {
            title: self.title.clone(),
            content: self.content.clone(),
            published: Some(self.published),
            video_url: non_empty(&self.video_url),
            image_url: self.image_url.clone(),
        }
    }

    pub fn patch(&self) -> PostPatch {
        PostPatch {
            title: Some(self.title.clone()),
            content: Some(self.content.clone()),
            published: Some(self.published),
            video_url: match non_empty(&self.video_url) {
                Some(url) => Patch::Set(url),
                None => Patch::Clear,
            },
            // Untouched this session: leave the key off the wire.
            image_url: if self.image_url == self.initial_image_url {
                Patch::Keep
            } else {
                match &self.image_url {
                    Some(url) => Patch::Set(url.clone()),
                    None => Patch::Clear,
                }
            },
        }
    }

    /// Runs the selected file through the object store.
    pub async fn upload_image(&mut self, api: &dyn PostApi) -> Result<String, FormError> {
        let file = self.begin_upload()?;
        let outcome = api.upload_image(&file).await;
        self.finish_upload(outcome)
    }

    /// Submits the form. On success the controller's job ends; navigation
    /// is the caller's concern.
    pub async fn submit(&mut self, api: &dyn PostApi, target: SubmitTarget) -> Result<Post, FormError> {
        self.check_submit()?;
        self.submitting = true;
        let result = match target {
            SubmitTarget::Create => api.create_post(&self.new_post()).await,
            SubmitTarget::Update(id) => api.update_post(id, &self.patch()).await,
        };
        self.submitting = false;
        Ok(result?)
    }
}

impl Default for PostForm {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::model::Author;

    #[derive(Default)]
    struct MockApi {
        calls: Mutex<Vec<&'static str>>,
        fail_upload: bool,
        last_new_post: Mutex<Option<NewPost>>,
        last_patch: Mutex<Option<PostPatch>>,
    }

    impl MockApi {
        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn canned_post() -> Post {
            let now = Utc::now();
            Post {
                id: Uuid::new_v4(),
                title: "T".into(),
                content: "C".into(),
                video_url: None,
                image_url: None,
                published: true,
                author_id: Uuid::new_v4(),
                author: Author {
                    name: "Ada".into(),
                    email: "ada@a.test".into(),
                },
                created_at: now,
                updated_at: now,
            }
        }
    }

    #[async_trait]
    impl PostApi for MockApi {
        async fn list_posts(&self, _query: Option<&str>) -> Result<Vec<Post>, ApiError> {
            self.calls.lock().unwrap().push("list");
            Ok(vec![])
        }

        async fn get_post(&self, _id: Uuid) -> Result<Post, ApiError> {
            self.calls.lock().unwrap().push("get");
            Ok(Self::canned_post())
        }

        async fn create_post(&self, new: &NewPost) -> Result<Post, ApiError> {
            self.calls.lock().unwrap().push("create");
            *self.last_new_post.lock().unwrap() = Some(new.clone());
            Ok(Self::canned_post())
        }

        async fn update_post(&self, _id: Uuid, patch: &PostPatch) -> Result<Post, ApiError> {
            self.calls.lock().unwrap().push("update");
            *self.last_patch.lock().unwrap() = Some(patch.clone());
            Ok(Self::canned_post())
        }

        async fn delete_post(&self, _id: Uuid) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push("delete");
            Ok(())
        }

        async fn upload_image(&self, _file: &ImageFile) -> Result<String, ApiError> {
            self.calls.lock().unwrap().push("upload");
            if self.fail_upload {
                Err(ApiError::Server(502))
            } else {
                Ok("https://cdn.test/uploaded.png".to_string())
            }
        }
    }

    fn image() -> ImageFile {
        ImageFile {
            name: "pic.png".into(),
            content_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        }
    }

    fn saved_post_with_image() -> Post {
        Post {
            image_url: Some("https://cdn.test/original.png".into()),
            ..MockApi::canned_post()
        }
    }

    fn filled_form() -> PostForm {
        let mut form = PostForm::new();
        form.set_title("Hello");
        form.set_content("World");
        form
    }

    #[tokio::test]
    async fn selected_but_unuploaded_image_blocks_submit_with_zero_calls() {
        let api = MockApi::default();
        let mut form = filled_form();
        form.select_image(image());

        let err = form.submit(&api, SubmitTarget::Create).await.unwrap_err();
        assert!(matches!(err, FormError::ImageNotUploaded));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_title_blocks_submit_with_zero_calls() {
        let api = MockApi::default();
        let mut form = PostForm::new();
        form.set_content("World");

        let err = form.submit(&api, SubmitTarget::Create).await.unwrap_err();
        assert!(matches!(err, FormError::EmptyField("title")));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn submit_is_rejected_while_an_upload_is_in_flight() {
        let api = MockApi::default();
        let mut form = filled_form();
        form.select_image(image());
        form.begin_upload().unwrap();

        let err = form.submit(&api, SubmitTarget::Create).await.unwrap_err();
        assert!(matches!(err, FormError::UploadInFlight));
        assert_eq!(api.call_count(), 0);

        // Only one upload may be in flight per form.
        assert!(matches!(form.begin_upload(), Err(FormError::UploadInFlight)));
    }

    #[tokio::test]
    async fn two_phase_flow_uploads_then_submits_the_durable_url() {
        let api = MockApi::default();
        let mut form = filled_form();
        form.select_image(image());

        let url = form.upload_image(&api).await.unwrap();
        assert_eq!(url, "https://cdn.test/uploaded.png");
        assert_eq!(form.upload_status(), UploadStatus::Uploaded);

        form.submit(&api, SubmitTarget::Create).await.unwrap();
        let sent = api.last_new_post.lock().unwrap().clone().unwrap();
        assert_eq!(sent.image_url.as_deref(), Some("https://cdn.test/uploaded.png"));
        assert_eq!(*api.calls.lock().unwrap(), vec!["upload", "create"]);
    }

    #[tokio::test]
    async fn failed_upload_reverts_to_the_saved_image_and_blocks_submit() {
        let api = MockApi {
            fail_upload: true,
            ..MockApi::default()
        };
        let saved = saved_post_with_image();
        let mut form = PostForm::edit(&saved);
        form.select_image(image());

        let err = form.upload_image(&api).await.unwrap_err();
        assert!(matches!(err, FormError::Api(ApiError::Server(502))));
        assert_eq!(form.upload_status(), UploadStatus::Failed);
        // The previously saved reference survives the failure.
        assert_eq!(form.image_url(), Some("https://cdn.test/original.png"));

        let err = form
            .submit(&api, SubmitTarget::Update(saved.id))
            .await
            .unwrap_err();
        assert!(matches!(err, FormError::UploadFailed));
        assert_eq!(api.call_count(), 1); // the upload only
    }

    #[tokio::test]
    async fn untouched_image_stays_off_the_wire() {
        let api = MockApi::default();
        let saved = saved_post_with_image();
        let mut form = PostForm::edit(&saved);
        form.set_title("Renamed");

        form.submit(&api, SubmitTarget::Update(saved.id)).await.unwrap();
        let patch = api.last_patch.lock().unwrap().clone().unwrap();
        assert!(patch.image_url.is_keep());
        assert_eq!(patch.title.as_deref(), Some("Renamed"));
    }

    #[tokio::test]
    async fn cleared_image_sends_an_explicit_null() {
        let api = MockApi::default();
        let saved = saved_post_with_image();
        let mut form = PostForm::edit(&saved);
        form.clear_image();

        form.submit(&api, SubmitTarget::Update(saved.id)).await.unwrap();
        let patch = api.last_patch.lock().unwrap().clone().unwrap();
        assert_eq!(patch.image_url, Patch::Clear);
    }

    #[tokio::test]
    async fn replacing_the_image_sends_the_new_url() {
        let api = MockApi::default();
        let saved = saved_post_with_image();
        let mut form = PostForm::edit(&saved);
        form.select_image(image());
        form.upload_image(&api).await.unwrap();

        form.submit(&api, SubmitTarget::Update(saved.id)).await.unwrap();
        let patch = api.last_patch.lock().unwrap().clone().unwrap();
        assert_eq!(patch.image_url, Patch::Set("https://cdn.test/uploaded.png".into()));
    }

    #[tokio::test]
    async fn empty_video_field_clears_on_update() {
        let api = MockApi::default();
        let saved = Post {
            video_url: Some("https://video.test/v".into()),
            ..MockApi::canned_post()
        };
        let mut form = PostForm::edit(&saved);
        form.set_video_url("  ");

        form.submit(&api, SubmitTarget::Update(saved.id)).await.unwrap();
        let patch = api.last_patch.lock().unwrap().clone().unwrap();
        assert_eq!(patch.video_url, Patch::Clear);
    }

    #[test]
    fn clearing_after_a_failure_unblocks_submission() {
        let saved = saved_post_with_image();
        let mut form = PostForm::edit(&saved);
        form.set_title("T");
        form.set_content("C");
        form.select_image(image());
        form.begin_upload().unwrap();
        let _ = form.finish_upload(Err(ApiError::Server(502)));

        assert!(matches!(form.check_submit(), Err(FormError::UploadFailed)));
        form.clear_image();
        assert!(form.check_submit().is_ok());
        assert_eq!(form.patch().image_url, Patch::Clear);
    }
}
