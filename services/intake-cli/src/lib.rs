mod attachment;
mod cli;
mod submit;

use booking_intake::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
