use serde::Serialize;

// Validated contact submission, forwarded verbatim to the webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    name: String,
    phone: String,
    course: String,
    message: String,
    timestamp: String,
}

impl Submission {
    // only validation builds these
    pub(crate) fn new(
        name: String,
        phone: String,
        course: String,
        message: String,
        timestamp: String,
    ) -> Self {
        Self {
            name,
            phone,
            course,
            message,
            timestamp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn course(&self) -> &str {
        &self.course
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

// Success acknowledgment returned to the browser
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
    pub message: &'static str,
}

impl Ack {
    pub fn sent() -> Self {
        Self {
            success: true,
            message: "Data sent successfully",
        }
    }
}

// Error body, `{ "error": "..." }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
