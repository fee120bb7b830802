use std::path::{Path, PathBuf};

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::Query;
use serde::Deserialize;
use shopscout_core::Product;
use tempfile::TempDir;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

const UPLOAD_FIELD: &str = "file";
const MAX_FILE_NAME_CHARS: usize = 100;
const FALLBACK_FILE_NAME: &str = "upload";

/// Query-string parameters shared by both search endpoints.
///
/// `sites` may repeat (`sites=amazon&sites=croma`) or be comma-separated
/// (`sites=amazon,croma`); both forms may be mixed.
#[derive(Debug, Default, PartialEq, Eq, Deserialize)]
pub(super) struct SearchQuery {
    pub q: Option<String>,
    #[serde(default)]
    pub sites: Vec<String>,
}

impl SearchQuery {
    fn non_blank_query(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Site ids in request order with comma lists expanded and blanks
    /// dropped.
    fn site_ids(&self) -> Vec<String> {
        self.sites
            .iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

pub(super) async fn text_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let Some(query) = params.non_blank_query() else {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "query parameter `q` is required",
        ));
    };
    let sites = params.site_ids();
    if sites.is_empty() {
        return Err(no_sites(req_id.0));
    }

    tracing::info!(query, sites = ?sites, "text search");
    let products = state.aggregator.search(query, &sites).await;
    Ok(Json(products))
}

pub(super) async fn image_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
    mut multipart: Multipart,
) -> Result<Json<Vec<Product>>, ApiError> {
    let sites = params.site_ids();
    if sites.is_empty() {
        return Err(no_sites(req_id.0));
    }

    let upload = read_upload(&mut multipart, state.max_upload_bytes)
        .await
        .map_err(|(code, message)| ApiError::new(req_id.0.clone(), code, message))?;

    let staged = StagedUpload::write(upload.file_name.as_deref(), &upload.bytes)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to stage uploaded image");
            ApiError::new(req_id.0.clone(), "internal_error", "failed to store upload")
        })?;

    tracing::info!(
        image = %staged.path().display(),
        bytes = upload.bytes.len(),
        sites = ?sites,
        "image search"
    );
    let products = state
        .aggregator
        .search_by_image(staged.path(), &sites)
        .await;
    Ok(Json(products))
}

fn no_sites(request_id: String) -> ApiError {
    ApiError::new(
        request_id,
        "bad_request",
        "at least one `sites` value is required",
    )
}

#[derive(Debug)]
struct Upload {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

/// Reads the `file` field. Errors are `(code, message)` pairs for
/// [`ApiError::new`].
async fn read_upload(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<Upload, (&'static str, String)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_failure(&e, max_bytes))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_failure(&e, max_bytes))?;

        if bytes.is_empty() {
            return Err(("bad_request", "uploaded file is empty".to_string()));
        }
        if bytes.len() > max_bytes {
            return Err(too_large(max_bytes));
        }
        return Ok(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    Err((
        "bad_request",
        format!("multipart field `{UPLOAD_FIELD}` is required"),
    ))
}

fn multipart_failure(error: &MultipartError, max_bytes: usize) -> (&'static str, String) {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_bytes)
    } else {
        ("bad_request", format!("malformed multipart body: {error}"))
    }
}

fn too_large(max_bytes: usize) -> (&'static str, String) {
    (
        "payload_too_large",
        format!("uploaded file exceeds {max_bytes} bytes"),
    )
}

/// An uploaded image written to a private temporary directory under its
/// sanitized original name. The name matters: adapters without a real image
/// flow search by the file's stem. Dropping the value removes the directory.
struct StagedUpload {
    _dir: TempDir,
    path: PathBuf,
}

impl StagedUpload {
    async fn write(file_name: Option<&str>, bytes: &[u8]) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("shopscout-upload-")
            .tempdir()?;
        let path = dir.path().join(sanitize_file_name(file_name));
        tokio::fs::write(&path, bytes).await?;
        Ok(Self { _dir: dir, path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Last path segment of a client-supplied name, restricted to a safe
/// character set.
fn sanitize_file_name(raw: Option<&str>) -> String {
    let base = raw
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '))
        .take(MAX_FILE_NAME_CHARS)
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ' ');
    if cleaned.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}
