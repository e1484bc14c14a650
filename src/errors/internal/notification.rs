use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Sending email to {recipient} failed: {message}")]
    Delivery { recipient: String, message: String },

    #[error("Mail gateway rejected message to {recipient} with status {status}: {body}")]
    Rejected {
        recipient: String,
        status: u16,
        body: String,
    },
}
