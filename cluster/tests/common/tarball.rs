//! In-memory distribution archives
//!
//! Also compiled into the crate's unit tests, so it only depends on
//! external crates.

use async_compression::tokio::write::GzipEncoder;
use tokio::io::AsyncWriteExt;

/// Build an in-memory `.tar.gz` from (path, content, mode) entries
pub async fn build_tarball(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let mut builder = tokio_tar::Builder::new(GzipEncoder::new(Vec::new()));

    for (path, data, mode) in entries {
        let mut header = tokio_tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder
            .append_data(&mut header, path, *data)
            .await
            .expect("Append tar entry");
    }

    let mut encoder = builder.into_inner().await.expect("Finish tar archive");
    encoder.shutdown().await.expect("Finish gzip stream");
    encoder.into_inner()
}
