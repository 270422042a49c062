use crate::attachment::{check_attachment, CheckAttachmentArgs};
use crate::submit::{submit, SubmitArgs};
use booking_intake::error::AppError;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "booking-intake",
    about = "Submit service bookings through the relay and payment hand-off from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk a saved draft through the wizard and submit it
    Submit(SubmitArgs),
    /// Check a file against the attachment policy without sending anything
    CheckAttachment(CheckAttachmentArgs),
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Submit(args) => submit(args).await,
        Command::CheckAttachment(args) => check_attachment(args).await,
    }
}
