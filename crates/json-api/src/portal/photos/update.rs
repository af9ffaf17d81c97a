//! Update Photo Comment Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    errors::ApiError,
    extensions::*,
    portal::photos::{PhotoResponse, errors::into_api_error, parse_photo_id},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdatePhotoRequest {
    /// New comment; blank clears it
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PhotoUpdatedResponse {
    pub success: bool,
    pub photo: PhotoResponse,
}

/// Update Photo Comment Handler
///
/// Photos already synced to the CRM are locked.
#[endpoint(
    tags("portal"),
    summary = "Update Photo Comment",
    security(("portal_token" = []))
)]
pub(crate) async fn handler(
    photo_id: PathParam<String>,
    json: JsonBody<UpdatePhotoRequest>,
    depot: &mut Depot,
) -> Result<Json<PhotoUpdatedResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let photo = parse_photo_id(&photo_id)?;

    let comment = json
        .into_inner()
        .comment
        .map(|comment| comment.trim().to_string())
        .filter(|comment| !comment.is_empty());

    let updated = state
        .app
        .photos
        .update_comment(session, photo, comment)
        .await
        .map_err(into_api_error)?;

    Ok(Json(PhotoUpdatedResponse {
        success: true,
        photo: updated.into(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use portal_app::domain::photos::{
        MockPhotosService, PhotosServiceError, records::PhotoRecord,
    };

    use crate::{
        portal::photos::tests::{PHOTO_ID, make_photo},
        test_helpers::TestApp,
    };

    use super::*;

    fn make_service(photos: MockPhotosService) -> Service {
        TestApp::new()
            .photos(photos)
            .portal_service(Router::with_path("photos/{photo_id}").patch(handler))
    }

    #[tokio::test]
    async fn updates_the_comment() -> TestResult {
        let mut photos = MockPhotosService::new();

        photos
            .expect_update_comment()
            .once()
            .withf(|_, photo, comment| {
                photo.to_string() == PHOTO_ID && comment.as_deref() == Some("after")
            })
            .return_once(|_, _, comment| {
                Ok(PhotoRecord {
                    comment,
                    ..make_photo()
                })
            });

        let mut res = TestClient::patch(format!("http://example.com/photos/{PHOTO_ID}"))
            .json(&json!({ "token": "abc", "comment": " after " }))
            .send(&make_service(photos))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body["photo"]["comment"], json!("after"));

        Ok(())
    }

    #[tokio::test]
    async fn synced_photos_are_locked() -> TestResult {
        let mut photos = MockPhotosService::new();

        photos
            .expect_update_comment()
            .once()
            .return_once(|_, _, _| Err(PhotosServiceError::PhotoLocked));

        let mut res = TestClient::patch(format!("http://example.com/photos/{PHOTO_ID}"))
            .json(&json!({ "comment": "after" }))
            .send(&make_service(photos))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
        assert_eq!(body["reason"], json!("photo_locked"));

        Ok(())
    }

    #[tokio::test]
    async fn malformed_ids_are_not_found() -> TestResult {
        let res = TestClient::patch("http://example.com/photos/not-a-uuid")
            .json(&json!({ "comment": "after" }))
            .send(&make_service(MockPhotosService::new()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
