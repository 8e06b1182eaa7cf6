use uuid::Uuid;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
        pub struct $name(pub Uuid);

        impl $name {
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_type!(SubscriptionId);
id_type!(WebhookJobId);
id_type!(DeliveryRecordId);

/// Workspace identifiers are owned by the host platform and opaque to the pipeline.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct WorkspaceId(pub String);

impl WorkspaceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkspaceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! id_unique_test {
        ($name:ident, $test_name:ident) => {
            #[test]
            fn $test_name() {
                let result = $name::new();
                assert_ne!(result.0, $name::new().0)
            }
        };
    }

    id_unique_test!(
        SubscriptionId,
        given_new_subscription_id_when_generated_should_be_unique
    );
    id_unique_test!(
        WebhookJobId,
        given_new_webhook_job_id_when_generated_should_be_unique
    );
    id_unique_test!(
        DeliveryRecordId,
        given_new_delivery_record_id_when_generated_should_be_unique
    );

    #[test]
    fn given_job_id_when_displayed_should_render_hyphenated_uuid() {
        let id = WebhookJobId::new();
        assert_eq!(id.to_string(), id.0.hyphenated().to_string());
    }
}
