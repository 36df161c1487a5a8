use actix_multipart::Multipart;
use futures::TryStreamExt;

use crate::inference::ImagePayload;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Malformed upload: {0}")]
    Multipart(String),
    #[error("No files uploaded")]
    NoFiles,
    #[error("Upload exceeds the {0} byte limit")]
    TooLarge(usize),
    #[error("Invalid top_n: {0}")]
    InvalidTopN(String),
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub images: Vec<ImagePayload>,
    pub top_n: Option<usize>,
}

/// Reads the file parts named `file_field` (in submission order) plus an
/// optional `top_n` text part. Other parts are ignored.
pub async fn read_upload(
    mut payload: Multipart,
    file_field: &str,
    max_bytes: usize,
) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm::default();
    let mut total = 0usize;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| UploadError::Multipart(e.to_string()))?
    {
        let (name, file_name) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().map(str::to_string),
            ),
            None => continue,
        };

        let mut data = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| UploadError::Multipart(e.to_string()))?
        {
            total += chunk.len();
            if total > max_bytes {
                return Err(UploadError::TooLarge(max_bytes));
            }
            data.extend_from_slice(&chunk);
        }

        if name == file_field {
            if let Some(file_name) = file_name.filter(|f| !f.is_empty()) {
                form.images.push(ImagePayload::new(file_name, data));
            }
        } else if name == "top_n" {
            let text = String::from_utf8_lossy(&data);
            let top_n = text
                .trim()
                .parse()
                .map_err(|_| UploadError::InvalidTopN(text.to_string()))?;
            form.top_n = Some(top_n);
        }
    }

    if form.images.is_empty() {
        return Err(UploadError::NoFiles);
    }
    Ok(form)
}
