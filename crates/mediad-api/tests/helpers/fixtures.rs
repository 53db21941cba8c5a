//! Test fixtures: real PNG bytes plus minimal PDF/MP4 blobs.

use std::io::Cursor;

/// A decodable PNG of the given dimensions.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::new_rgb8(width, height);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode test png");
    buf.into_inner()
}

/// Bytes with a PNG's declared MIME type but a garbage body; passes
/// validation, fails decoding.
pub fn create_corrupt_png() -> Vec<u8> {
    vec![0x89, 0x50, 0x4E, 0x47, 0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]
}

/// Minimal valid PDF.
pub fn create_test_pdf() -> Vec<u8> {
    b"%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [3 0 R] /Count 1 >>
endobj
3 0 obj
<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>
endobj
trailer
<< /Size 4 /Root 1 0 R >>
%%EOF"
        .to_vec()
}

/// Minimal MP4 container (ftyp + padded mdat). Not decodable, but large
/// enough to exercise byte-range serving.
pub fn create_test_video() -> Vec<u8> {
    let mut mp4 = Vec::new();
    mp4.extend_from_slice(&[0x00, 0x00, 0x00, 0x20]);
    mp4.extend_from_slice(b"ftyp");
    mp4.extend_from_slice(b"isom");
    mp4.extend_from_slice(&[0x00, 0x00, 0x02, 0x00]);
    mp4.extend_from_slice(b"isomiso2mp41");
    let mdat_payload = vec![0xABu8; 1024];
    mp4.extend_from_slice(&((mdat_payload.len() as u32 + 8).to_be_bytes()));
    mp4.extend_from_slice(b"mdat");
    mp4.extend_from_slice(&mdat_payload);
    mp4
}
