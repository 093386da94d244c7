//! Quality profile backup format.
//!
//! ```xml
//! <profile>
//!   <name>ProfileForTest</name>
//!   <language>cpp</language>
//!   <rules>
//!     <rule>
//!       <repositoryKey>cpp</repositoryKey>
//!       <key>S106</key>
//!       <priority>MAJOR</priority>
//!     </rule>
//!   </rules>
//! </profile>
//! ```
//!
//! Only the fields needed to identify the profile and its activations are
//! read; rule parameters are left for the server to interpret.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use rig_core::entities::{QualityProfile, RuleActivation};

use crate::error::ProvisionError;

#[derive(Default)]
struct RuleBuilder {
    repository: Option<String>,
    key: Option<String>,
    priority: Option<String>,
}

/// Parse a profile backup document. `path` is only used in error messages.
///
/// # Errors
///
/// Returns [`ProvisionError::ProfileMalformed`] if the document is not
/// well-formed XML, has no `profile/name` or `profile/language`, or contains
/// a rule without a repository or key.
pub fn parse_profile(path: &Path, xml: &str) -> Result<QualityProfile, ProvisionError> {
    let malformed = |reason: String| ProvisionError::ProfileMalformed {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut name = None;
    let mut language = None;
    let mut rules = Vec::new();
    let mut current: Option<RuleBuilder> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let tag = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                if tag == "rule" && stack.last().is_some_and(|p| p == "rules") {
                    current = Some(RuleBuilder::default());
                }
                stack.push(tag);
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map_err(|e| malformed(format!("bad text content: {e}")))?
                    .into_owned();
                let path: Vec<&str> = stack.iter().map(String::as_str).collect();
                match path.as_slice() {
                    ["profile", "name"] => name = Some(value),
                    ["profile", "language"] => language = Some(value),
                    ["profile", "rules", "rule", field] => {
                        if let Some(rule) = current.as_mut() {
                            match *field {
                                "repositoryKey" => rule.repository = Some(value),
                                "key" => rule.key = Some(value),
                                "priority" => rule.priority = Some(value),
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                if stack.pop().as_deref() == Some("rule")
                    && let Some(rule) = current.take()
                {
                    let index = rules.len() + 1;
                    let (Some(repository), Some(key)) = (rule.repository, rule.key) else {
                        return Err(malformed(format!(
                            "rule #{index} needs both repositoryKey and key"
                        )));
                    };
                    rules.push(RuleActivation {
                        repository,
                        key,
                        priority: rule.priority,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(malformed(format!("XML parsing error: {err}"))),
            _ => {}
        }
    }

    let name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| malformed("missing profile/name".into()))?;
    let language = language
        .filter(|l| !l.is_empty())
        .ok_or_else(|| malformed("missing profile/language".into()))?;

    Ok(QualityProfile {
        name,
        language,
        rules,
    })
}

/// Read and parse the profile backup at `path`, returning the parsed profile
/// and the raw document for upload.
///
/// # Errors
///
/// Returns [`ProvisionError::ProfileUnreadable`] if the file cannot be read,
/// otherwise see [`parse_profile`].
pub async fn load_profile_file(path: &Path) -> Result<(QualityProfile, String), ProvisionError> {
    let xml = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ProvisionError::ProfileUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
    let profile = parse_profile(path, &xml)?;
    Ok((profile, xml))
}
