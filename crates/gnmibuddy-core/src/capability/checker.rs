// ── Preflight capability check ──
//
// Decides whether a request may be sent to a device. The decision itself is
// pure (`PreflightPolicy::evaluate`); `CapabilityChecker` adds the
// capability fetch in front of it.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::capability::{CapabilityFetcher, Encoding, EncodingChoice, EncodingPolicy, RequestInspector};
use crate::config::CheckOrder;
use crate::error::ErrorKind;
use crate::model::{CapabilityCheckResult, Device, DeviceCapabilities};
use crate::version::compare_versions;

type Rejection = (ErrorKind, String);

/// Pure preflight rules: encoding negotiation plus model validation.
#[derive(Debug, Clone, Default)]
pub struct PreflightPolicy {
    pub inspector: RequestInspector,
    pub encoding_policy: EncodingPolicy,
    pub order: CheckOrder,
}

impl PreflightPolicy {
    pub fn new(inspector: RequestInspector, encoding_policy: EncodingPolicy, order: CheckOrder) -> Self {
        Self {
            inspector,
            encoding_policy,
            order,
        }
    }

    /// Evaluate a request against already-known capabilities.
    ///
    /// Fails on the first missing model or when no encoding is usable.
    /// Older or unversioned models and encoding fallback only add warnings.
    pub fn evaluate<S: AsRef<str>>(
        &self,
        caps: &DeviceCapabilities,
        paths: &[S],
        requested: Option<&Encoding>,
    ) -> CapabilityCheckResult {
        let mut warnings = Vec::new();

        let outcome = match self.order {
            CheckOrder::EncodingFirst => self
                .negotiate_encoding(caps, requested, &mut warnings)
                .and_then(|choice| {
                    self.validate_models(caps, paths, &mut warnings)?;
                    Ok(choice)
                }),
            CheckOrder::ModelsFirst => self
                .validate_models(caps, paths, &mut warnings)
                .and_then(|()| self.negotiate_encoding(caps, requested, &mut warnings)),
        };

        match outcome {
            Ok(choice) => {
                CapabilityCheckResult::passed(Some(choice.encoding), choice.was_fallback, warnings)
            }
            Err((kind, message)) => CapabilityCheckResult::failed(kind, message, warnings),
        }
    }

    fn negotiate_encoding(
        &self,
        caps: &DeviceCapabilities,
        requested: Option<&Encoding>,
        warnings: &mut Vec<String>,
    ) -> Result<EncodingChoice, Rejection> {
        let Some(choice) = self.encoding_policy.choose_supported(requested, &caps.encodings) else {
            let advertised = list_encodings(caps);
            let message = match requested {
                Some(req) => format!(
                    "Requested encoding '{req}' is not supported by device (advertised: {advertised})"
                ),
                None => format!("Device advertises no usable encoding (advertised: {advertised})"),
            };
            return Err((ErrorKind::EncodingNotSupported, message));
        };

        if choice.was_fallback {
            if let Some(req) = requested {
                warnings.push(format!(
                    "Requested encoding '{req}' is not supported by device; using '{}' instead",
                    choice.encoding
                ));
            }
        }
        Ok(choice)
    }

    fn validate_models<S: AsRef<str>>(
        &self,
        caps: &DeviceCapabilities,
        paths: &[S],
        warnings: &mut Vec<String>,
    ) -> Result<(), Rejection> {
        for req in self.inspector.infer_requirements(paths) {
            let Some(model) = caps.model(&req.name) else {
                return Err((
                    ErrorKind::ModelNotSupported,
                    format!(
                        "Required model '{}>={}' not supported by device",
                        req.name, req.minimum_version
                    ),
                ));
            };

            match compare_versions(model.version.as_deref(), Some(&req.minimum_version)) {
                Some(Ordering::Less) => warnings.push(format!(
                    "Model '{}' is older than required (device has {} < {}); \
                     some collectors may not work correctly",
                    req.name,
                    model.version.as_deref().unwrap_or_default(),
                    req.minimum_version
                )),
                None => warnings.push(format!(
                    "Model '{}' version could not be compared with required {}; \
                     continuing without a version check",
                    req.name, req.minimum_version
                )),
                Some(_) => {}
            }
        }
        Ok(())
    }
}

fn list_encodings(caps: &DeviceCapabilities) -> String {
    if caps.encodings.is_empty() {
        return "none".into();
    }
    caps.encodings
        .iter()
        .map(Encoding::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

// ── CapabilityChecker ───────────────────────────────────────────────

/// Fetch-then-evaluate preflight for a live device.
#[derive(Debug)]
pub struct CapabilityChecker {
    fetcher: Arc<CapabilityFetcher>,
    policy: PreflightPolicy,
}

impl CapabilityChecker {
    pub fn new(fetcher: Arc<CapabilityFetcher>, policy: PreflightPolicy) -> Self {
        Self { fetcher, policy }
    }

    pub fn fetcher(&self) -> &Arc<CapabilityFetcher> {
        &self.fetcher
    }

    pub fn policy(&self) -> &PreflightPolicy {
        &self.policy
    }

    /// Run the preflight for `paths` against `device`.
    ///
    /// A capability fetch failure is reported as a failed result with
    /// [`ErrorKind::CapabilityFetch`], never as an error.
    pub async fn check<S: AsRef<str>>(
        &self,
        device: &Device,
        paths: &[S],
        requested: Option<&Encoding>,
    ) -> CapabilityCheckResult {
        let caps = match self.fetcher.get_or_fetch(device).await {
            Ok(caps) => caps,
            Err(e) => {
                debug!(device = %device.name, error = %e, "preflight aborted");
                return CapabilityCheckResult::failed(ErrorKind::CapabilityFetch, e.to_string(), Vec::new());
            }
        };

        let result = self.policy.evaluate(&caps, paths, requested);
        debug!(
            device = %device.name,
            success = result.success,
            encoding = ?result.selected_encoding,
            warnings = result.warnings.len(),
            "preflight evaluated"
        );
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::capability::ModelTable;
    use crate::model::ModelIdentifier;
    use indexmap::IndexSet;

    fn caps(models: &[(&str, Option<&str>)], encodings: &[Encoding]) -> DeviceCapabilities {
        DeviceCapabilities {
            models: models
                .iter()
                .map(|(n, v)| ModelIdentifier::new(*n, *v))
                .collect(),
            encodings: encodings.iter().cloned().collect::<IndexSet<_>>(),
            protocol_version: None,
        }
    }

    fn policy_x(order: CheckOrder) -> PreflightPolicy {
        let table = Arc::new(ModelTable::new().with_model("moduleX", "2.0.0"));
        PreflightPolicy::new(RequestInspector::new(table), EncodingPolicy::default(), order)
    }

    #[test]
    fn older_model_warns_but_passes() {
        let device = caps(&[("moduleX", Some("1.5.0"))], &[Encoding::JsonIetf]);
        let result = policy_x(CheckOrder::EncodingFirst).evaluate(
            &device,
            &["moduleX:/a"],
            Some(&Encoding::JsonIetf),
        );
        assert!(result.success);
        assert_eq!(result.selected_encoding, Some(Encoding::JsonIetf));
        assert!(!result.used_fallback);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("1.5.0"));
        assert!(result.warnings[0].contains("2.0.0"));
    }

    #[test]
    fn missing_model_fails_with_name_and_minimum() {
        let device = caps(&[], &[Encoding::JsonIetf]);
        let result = policy_x(CheckOrder::EncodingFirst).evaluate(
            &device,
            &["moduleX:/a"],
            Some(&Encoding::JsonIetf),
        );
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::ModelNotSupported));
        let msg = result.error_message.unwrap();
        assert!(msg.contains("moduleX"));
        assert!(msg.contains("2.0.0"));
    }

    #[test]
    fn unversioned_model_warns() {
        let device = caps(&[("moduleX", None)], &[Encoding::Json]);
        let result = policy_x(CheckOrder::EncodingFirst).evaluate(&device, &["moduleX:/a"], None);
        assert!(result.success);
        assert_eq!(result.selected_encoding, Some(Encoding::Json));
        assert!(result.warnings[0].contains("could not be compared"));
    }

    #[test]
    fn fallback_is_flagged_and_noted() {
        let device = caps(&[("moduleX", Some("2.0.0"))], &[Encoding::Ascii]);
        let result = policy_x(CheckOrder::EncodingFirst).evaluate(
            &device,
            &["moduleX:/a"],
            Some(&Encoding::JsonIetf),
        );
        assert!(result.success);
        assert!(result.used_fallback);
        assert_eq!(result.selected_encoding, Some(Encoding::Ascii));
        assert!(result.warnings.iter().any(|w| w.contains("using 'ascii'")));
    }

    #[test]
    fn check_order_decides_reported_kind() {
        let device = caps(&[], &[Encoding::Proto]);
        let paths = ["moduleX:/a"];

        let enc_first = policy_x(CheckOrder::EncodingFirst).evaluate(&device, &paths, None);
        assert_eq!(enc_first.error_kind, Some(ErrorKind::EncodingNotSupported));

        let models_first = policy_x(CheckOrder::ModelsFirst).evaluate(&device, &paths, None);
        assert_eq!(models_first.error_kind, Some(ErrorKind::ModelNotSupported));
    }

    #[test]
    fn paths_without_known_models_only_need_an_encoding() {
        let device = caps(&[], &[Encoding::JsonIetf]);
        let result = PreflightPolicy::default().evaluate(&device, &["vendor:/x"], None);
        assert!(result.success);
        assert!(result.warnings.is_empty());
    }
}
