use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use sha2::{Digest, Sha256};

use super::{ImageStore, StorageError};

#[derive(Clone)]
pub struct S3ImageStore {
    client: Client,
    bucket_name: String,
    max_size: usize,
}

impl S3ImageStore {
    pub fn new(client: Client, bucket_name: String, max_size: usize) -> Self {
        Self {
            client,
            bucket_name,
            max_size,
        }
    }

    pub fn calculate_image_hash(image_data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(image_data);
        hex::encode(hasher.finalize())
    }

    pub fn generate_s3_key(image_hash: &str, key: &str) -> String {
        format!("images/{}/{}", image_hash, key)
    }

    pub fn validate_content_type(content_type: &str) -> Result<(), StorageError> {
        match content_type {
            "image/jpeg" | "image/png" | "image/webp" | "image/gif" => Ok(()),
            _ => Err(StorageError::InvalidFormat),
        }
    }

    pub fn validate_image_size(&self, image_data: &[u8]) -> Result<(), StorageError> {
        if image_data.len() > self.max_size {
            return Err(StorageError::FileTooLarge);
        }
        Ok(())
    }

    pub fn object_url(&self, s3_key: &str) -> String {
        format!("https://{}.s3.amazonaws.com/{}", self.bucket_name, s3_key)
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String, StorageError> {
        self.validate_image_size(data)?;
        S3ImageStore::validate_content_type(content_type)?;

        let s3_key = S3ImageStore::generate_s3_key(&S3ImageStore::calculate_image_hash(data), key);
        let body = ByteStream::from(data.to_vec());

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&s3_key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                log::error!("S3 put_object failed for {}: {:?}", s3_key, e);
                StorageError::S3(e.to_string())
            })?;

        log::info!("Uploaded {} to bucket {}", s3_key, self.bucket_name);
        Ok(self.object_url(&s3_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(
            S3ImageStore::calculate_image_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn key_nests_under_content_hash() {
        assert_eq!(S3ImageStore::generate_s3_key("ff00", "1a_wing.png"), "images/ff00/1a_wing.png");
    }

    #[test]
    fn only_image_types_are_accepted() {
        assert!(S3ImageStore::validate_content_type("image/png").is_ok());
        assert!(matches!(
            S3ImageStore::validate_content_type("text/plain"),
            Err(StorageError::InvalidFormat)
        ));
    }
}
