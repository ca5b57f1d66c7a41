use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::device::driver::DeviceDriver;
use crate::device::error::DeviceError;
use crate::hierarchy::snapshot::HierarchySnapshot;
use crate::oracle::backend::Oracle;
use crate::oracle::conversation::Conversation;
use crate::oracle::parse::{ElementInfo, is_affirmative, parse_element_info, parse_locator};
use crate::resolver::error::ResolveError;
use crate::resolver::prompts::{
    another_locator_request, extraction_prompt, presence_prompt, reformat_request,
};

pub const DEFAULT_PRESENCE_ATTEMPTS: u32 = 3;
pub const DEFAULT_MAX_LOCATOR_RETRIES: u32 = 5;
pub const DEFAULT_MAX_PARSE_ATTEMPTS: u32 = 2;

/// Retry bounds of the resolution loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Presence checks before giving up with `ElementNotFound`
    pub presence_attempts: u32,
    /// Replacement locators requested before giving up with `LocatorAmbiguity`
    pub max_locator_retries: u32,
    /// Oracle replies accepted per structured request before `OracleParse`
    pub max_parse_attempts: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            presence_attempts: DEFAULT_PRESENCE_ATTEMPTS,
            max_locator_retries: DEFAULT_MAX_LOCATOR_RETRIES,
            max_parse_attempts: DEFAULT_MAX_PARSE_ATTEMPTS,
        }
    }
}

/// Successful resolution of a natural-language element request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedElement {
    pub locator: String,
    pub name: String,
    pub screen_name: String,
    pub screen_description: String,
    /// Raw dump the locator was derived from
    pub hierarchy: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolveState {
    CheckPresence { attempt: u32 },
    ExtractInfo { attempt: u32 },
    Verify { info: ElementInfo },
    RequestLocator { info: ElementInfo, attempt: u32 },
    Done { info: ElementInfo },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Unique,
    Retry,
}

/// Exactly one match ends the loop; zero or several ask for another locator.
pub fn verify(matches: usize) -> Verdict {
    if matches == 1 {
        Verdict::Unique
    } else {
        Verdict::Retry
    }
}

/// Per-call state: owned by one `resolve` call and dropped with it.
struct Resolution<'r> {
    request: &'r str,
    conversation: Conversation,
    hierarchy: String,
    locator_retries: u32,
}

/// Finds a locator that selects exactly one element matching a request.
///
/// Each call captures a fresh hierarchy, confirms presence with the oracle,
/// asks for a locator and then loops on the live match count until it is
/// unique or a retry bound is hit.
pub struct ElementResolver<'o> {
    oracle: &'o dyn Oracle,
    config: ResolverConfig,
    last_hierarchy: Option<String>,
}

impl<'o> ElementResolver<'o> {
    pub fn new(oracle: &'o dyn Oracle) -> Self {
        Self::with_config(oracle, ResolverConfig::default())
    }

    pub fn with_config(oracle: &'o dyn Oracle, mut config: ResolverConfig) -> Self {
        config.presence_attempts = config.presence_attempts.max(1);
        config.max_parse_attempts = config.max_parse_attempts.max(1);
        Self {
            oracle,
            config,
            last_hierarchy: None,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Dump captured by the latest `resolve` call, if it got that far.
    pub fn last_hierarchy(&self) -> Option<&str> {
        self.last_hierarchy.as_deref()
    }

    pub fn resolve(
        &mut self,
        device: &mut dyn DeviceDriver,
        request: &str,
    ) -> Result<ResolvedElement, ResolveError> {
        info!(request, "resolving element");
        self.last_hierarchy = None;

        let mut ctx = Resolution {
            request,
            conversation: Conversation::new(),
            hierarchy: String::new(),
            locator_retries: 0,
        };
        let mut state = ResolveState::CheckPresence { attempt: 1 };

        loop {
            state = match state {
                ResolveState::Done { info } => {
                    info!(request, locator = %info.xpath, "element resolved");
                    return Ok(ResolvedElement {
                        locator: info.xpath,
                        name: info.name,
                        screen_name: info.screen,
                        screen_description: info.screen_description,
                        hierarchy: ctx.hierarchy,
                    });
                }
                other => self.step(other, device, &mut ctx)?,
            };
        }
    }

    /// Transition function of the resolution loop.
    fn step(
        &mut self,
        state: ResolveState,
        device: &mut dyn DeviceDriver,
        ctx: &mut Resolution<'_>,
    ) -> Result<ResolveState, ResolveError> {
        match state {
            ResolveState::CheckPresence { attempt } => self.check_presence(attempt, device, ctx),
            ResolveState::ExtractInfo { attempt } => self.extract_info(attempt, ctx),
            ResolveState::Verify { info } => self.verify_locator(info, device, ctx),
            ResolveState::RequestLocator { info, attempt } => {
                self.request_locator(info, attempt, ctx)
            }
            done @ ResolveState::Done { .. } => Ok(done),
        }
    }

    fn check_presence(
        &mut self,
        attempt: u32,
        device: &mut dyn DeviceDriver,
        ctx: &mut Resolution<'_>,
    ) -> Result<ResolveState, ResolveError> {
        let snapshot = self.capture(device)?;
        debug!(
            attempt,
            nodes = snapshot.node_count(),
            fingerprint = %snapshot.fingerprint(),
            "captured hierarchy"
        );

        let reply = self
            .oracle
            .complete(&Conversation::prompt(presence_prompt(ctx.request, &snapshot.render())))?;

        if is_affirmative(&reply) {
            info!(request = ctx.request, "element presented");
            ctx.conversation = Conversation::prompt(extraction_prompt(
                ctx.request,
                &snapshot.render_without_bounds(),
            ));
            ctx.hierarchy = snapshot.into_raw();
            return Ok(ResolveState::ExtractInfo { attempt: 1 });
        }

        warn!(request = ctx.request, attempt, reply = reply.trim(), "element not presented");
        if attempt < self.config.presence_attempts {
            Ok(ResolveState::CheckPresence {
                attempt: attempt + 1,
            })
        } else {
            Err(ResolveError::ElementNotFound {
                request: ctx.request.to_string(),
                attempts: attempt,
            })
        }
    }

    fn extract_info(
        &mut self,
        attempt: u32,
        ctx: &mut Resolution<'_>,
    ) -> Result<ResolveState, ResolveError> {
        let reply = self.oracle.complete(&ctx.conversation)?;
        ctx.conversation.push_assistant(reply.as_str());

        match parse_element_info(&reply) {
            Ok(info) => Ok(ResolveState::Verify { info }),
            Err(e) if attempt < self.config.max_parse_attempts => {
                warn!(attempt, "element info rejected: {}", e);
                ctx.conversation.push_user(reformat_request(&e.to_string()));
                Ok(ResolveState::ExtractInfo {
                    attempt: attempt + 1,
                })
            }
            Err(e) => Err(ResolveError::OracleParse {
                attempts: attempt,
                source: e,
            }),
        }
    }

    fn verify_locator(
        &mut self,
        info: ElementInfo,
        device: &mut dyn DeviceDriver,
        ctx: &mut Resolution<'_>,
    ) -> Result<ResolveState, ResolveError> {
        let matches = count_matches(device, &info.xpath)?;

        match verify(matches) {
            Verdict::Unique => {
                info!("single element with xpath = {}", info.xpath);
                Ok(ResolveState::Done { info })
            }
            Verdict::Retry if ctx.locator_retries >= self.config.max_locator_retries => {
                Err(ResolveError::LocatorAmbiguity {
                    request: ctx.request.to_string(),
                    locator: info.xpath,
                    matches,
                    retries: ctx.locator_retries,
                })
            }
            Verdict::Retry => {
                info!("retry: {} with xpath = {}", matches, info.xpath);
                ctx.locator_retries += 1;
                ctx.conversation.push_user(another_locator_request(matches));
                Ok(ResolveState::RequestLocator { info, attempt: 1 })
            }
        }
    }

    fn request_locator(
        &mut self,
        mut info: ElementInfo,
        attempt: u32,
        ctx: &mut Resolution<'_>,
    ) -> Result<ResolveState, ResolveError> {
        let reply = self.oracle.complete(&ctx.conversation)?;
        ctx.conversation.push_assistant(reply.as_str());

        match parse_locator(&reply) {
            Ok(locator) => {
                info.xpath = locator;
                Ok(ResolveState::Verify { info })
            }
            Err(e) if attempt < self.config.max_parse_attempts => {
                warn!(attempt, "locator reply rejected: {}", e);
                ctx.conversation
                    .push_user(reformat_request("return only the xpath string"));
                Ok(ResolveState::RequestLocator {
                    info,
                    attempt: attempt + 1,
                })
            }
            Err(e) => Err(ResolveError::OracleParse {
                attempts: attempt,
                source: e,
            }),
        }
    }

    fn capture(&mut self, device: &mut dyn DeviceDriver) -> Result<HierarchySnapshot, ResolveError> {
        let raw = device.dump_hierarchy()?;
        self.last_hierarchy = Some(raw.clone());
        Ok(HierarchySnapshot::parse(raw)?)
    }
}

/// Live match count; a locator the device cannot evaluate matches nothing.
fn count_matches(device: &mut dyn DeviceDriver, locator: &str) -> Result<usize, ResolveError> {
    match device.count_matches(locator) {
        Ok(n) => Ok(n),
        Err(DeviceError::InvalidLocator { reason, .. }) => {
            debug!(locator, "locator not evaluable: {}", reason);
            Ok(0)
        }
        Err(e) => Err(e.into()),
    }
}
