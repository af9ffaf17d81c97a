//! Delete Photo Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    errors::ApiError,
    extensions::*,
    portal::photos::{errors::into_api_error, parse_photo_id},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PhotoDeletedResponse {
    pub success: bool,
}

/// Delete Photo Handler
///
/// Removes an unsynced photo together with its pending ledger entry.
#[endpoint(
    tags("portal"),
    summary = "Delete Photo",
    security(("portal_token" = []))
)]
pub(crate) async fn handler(
    photo_id: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<PhotoDeletedResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let session = depot.portal_session_or_401()?;

    let photo = parse_photo_id(&photo_id)?;

    state
        .app
        .photos
        .delete_photo(session, photo)
        .await
        .map_err(into_api_error)?;

    Ok(Json(PhotoDeletedResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use portal_app::domain::photos::{MockPhotosService, PhotosServiceError};

    use crate::{portal::photos::tests::PHOTO_ID, test_helpers::TestApp};

    use super::*;

    fn make_service(photos: MockPhotosService) -> Service {
        TestApp::new()
            .photos(photos)
            .portal_service(Router::with_path("photos/{photo_id}").delete(handler))
    }

    #[tokio::test]
    async fn deletes_the_photo() -> TestResult {
        let mut photos = MockPhotosService::new();

        photos
            .expect_delete_photo()
            .once()
            .withf(|_, photo| photo.to_string() == PHOTO_ID)
            .return_once(|_, _| Ok(()));

        let mut res = TestClient::delete(format!("http://example.com/photos/{PHOTO_ID}"))
            .send(&make_service(photos))
            .await;

        let body: PhotoDeletedResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.success, "photo deleted");

        Ok(())
    }

    #[tokio::test]
    async fn photos_of_other_artisans_are_not_found() -> TestResult {
        let mut photos = MockPhotosService::new();

        photos
            .expect_delete_photo()
            .once()
            .return_once(|_, _| Err(PhotosServiceError::NotFound));

        let mut res = TestClient::delete(format!("http://example.com/photos/{PHOTO_ID}"))
            .send(&make_service(photos))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));
        assert_eq!(body["reason"], json!("photo_not_found"));

        Ok(())
    }
}
