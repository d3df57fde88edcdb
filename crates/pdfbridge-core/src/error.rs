use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfOpError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("At least {required} input files are required, got {got}")]
    NotEnoughInputs { required: usize, got: usize },

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF operation failed: {0}")]
    Operation(String),
}
