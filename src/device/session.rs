use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::device::driver::{DeviceDriver, DeviceKey, Direction, Point};
use crate::device::error::DeviceError;

/// How to start the device bridge process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Device serial handed to the bridge as `--serial`; first device when unset.
    pub serial: Option<String>,
}

impl Default for BridgeCommand {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec!["-u".to_string(), "device_bridge.py".to_string()],
            serial: None,
        }
    }
}

/// Request sent to the bridge over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DeviceRequest {
    DumpHierarchy {
        max_depth: u32,
    },
    CountMatches {
        xpath: String,
    },
    Click {
        xpath: String,
    },
    SwipeElement {
        xpath: String,
        direction: Direction,
    },
    Swipe {
        fx: u32,
        fy: u32,
        tx: u32,
        ty: u32,
    },
    SendKeys {
        text: String,
    },
    Press {
        key: String,
    },
    WindowSize,
    Quit,
}

impl DeviceRequest {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceRequest::DumpHierarchy { .. } => "dump_hierarchy",
            DeviceRequest::CountMatches { .. } => "count_matches",
            DeviceRequest::Click { .. } => "click",
            DeviceRequest::SwipeElement { .. } => "swipe_element",
            DeviceRequest::Swipe { .. } => "swipe",
            DeviceRequest::SendKeys { .. } => "send_keys",
            DeviceRequest::Press { .. } => "press",
            DeviceRequest::WindowSize => "window_size",
            DeviceRequest::Quit => "quit",
        }
    }

    /// Locator carried by the request, if any.
    fn xpath(&self) -> Option<&str> {
        match self {
            DeviceRequest::CountMatches { xpath }
            | DeviceRequest::Click { xpath }
            | DeviceRequest::SwipeElement { xpath, .. } => Some(xpath),
            _ => None,
        }
    }
}

/// Response received from the bridge over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct DeviceResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Machine-readable failure class: `locator_not_found`, `invalid_locator`.
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub hierarchy: Option<String>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

const DUMP_MAX_DEPTH: u32 = 100;

/// A persistent device session backed by a bridge process.
///
/// The bridge keeps one automation connection to the device open. Commands
/// are sent as NDJSON over stdin, responses read from stdout.
pub struct DeviceSession {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    stopped: bool,
}

impl DeviceSession {
    /// Spawn the bridge and wait for its ready signal.
    pub fn launch(command: &BridgeCommand) -> Result<Self, DeviceError> {
        let mut process = Command::new(&command.program);
        process.args(&command.args);
        if let Some(serial) = &command.serial {
            process.arg("--serial").arg(serial);
        }

        let mut child = process
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| DeviceError::Spawn {
                program: command.program.clone(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DeviceError::SessionIO("failed to capture bridge stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DeviceError::SessionIO("failed to capture bridge stdout".into()))?;

        let mut reader = BufReader::new(stdout);
        let response = read_response(&mut reader, "ready signal")?;

        if !response.ok || response.ready != Some(true) {
            return Err(DeviceError::Protocol {
                command: "launch".into(),
                error: response
                    .error
                    .unwrap_or_else(|| "bridge did not report ready".into()),
            });
        }

        debug!(program = %command.program, "device bridge ready");

        Ok(DeviceSession {
            child,
            stdin,
            reader,
            stopped: false,
        })
    }

    fn send(&mut self, request: &DeviceRequest) -> Result<DeviceResponse, DeviceError> {
        let json = serde_json::to_string(request).map_err(|e| DeviceError::Json {
            context: "DeviceRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json)
            .map_err(|e| DeviceError::SessionIO(format!("failed to write to bridge: {}", e)))?;
        self.stdin
            .flush()
            .map_err(|e| DeviceError::SessionIO(format!("failed to flush bridge stdin: {}", e)))?;

        read_response(&mut self.reader, request.name())
    }

    /// Send a request and map failures to typed errors.
    fn send_ok(&mut self, request: &DeviceRequest) -> Result<DeviceResponse, DeviceError> {
        let response = self.send(request)?;
        if response.ok {
            return Ok(response);
        }

        let error = response.error.unwrap_or_else(|| "unknown error".into());
        let locator = request.xpath().unwrap_or_default().to_string();
        Err(match response.kind.as_deref() {
            Some("locator_not_found") => DeviceError::LocatorNotFound(locator),
            Some("invalid_locator") => DeviceError::InvalidLocator {
                locator,
                reason: error,
            },
            _ => DeviceError::Protocol {
                command: request.name().into(),
                error,
            },
        })
    }

    fn missing(command: &str, field: &str) -> DeviceError {
        DeviceError::Protocol {
            command: command.into(),
            error: format!("no '{}' in response", field),
        }
    }
}

fn read_response(
    reader: &mut BufReader<ChildStdout>,
    context: &str,
) -> Result<DeviceResponse, DeviceError> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| DeviceError::SessionIO(format!("failed to read {}: {}", context, e)))?;

    if line.trim().is_empty() {
        return Err(DeviceError::SessionIO(format!(
            "empty response for {} (bridge may have exited)",
            context
        )));
    }

    serde_json::from_str(line.trim()).map_err(|e| DeviceError::Json {
        context: format!("bridge response to {}", context),
        source: e,
    })
}

impl DeviceDriver for DeviceSession {
    fn dump_hierarchy(&mut self) -> Result<String, DeviceError> {
        let response = self.send_ok(&DeviceRequest::DumpHierarchy {
            max_depth: DUMP_MAX_DEPTH,
        })?;
        response
            .hierarchy
            .ok_or_else(|| Self::missing("dump_hierarchy", "hierarchy"))
    }

    fn count_matches(&mut self, locator: &str) -> Result<usize, DeviceError> {
        let response = self.send_ok(&DeviceRequest::CountMatches {
            xpath: locator.to_string(),
        })?;
        response
            .count
            .ok_or_else(|| Self::missing("count_matches", "count"))
    }

    fn click(&mut self, locator: &str) -> Result<(), DeviceError> {
        self.send_ok(&DeviceRequest::Click {
            xpath: locator.to_string(),
        })?;
        Ok(())
    }

    fn swipe_element(&mut self, locator: &str, direction: Direction) -> Result<(), DeviceError> {
        self.send_ok(&DeviceRequest::SwipeElement {
            xpath: locator.to_string(),
            direction,
        })?;
        Ok(())
    }

    fn swipe(&mut self, from: Point, to: Point) -> Result<(), DeviceError> {
        self.send_ok(&DeviceRequest::Swipe {
            fx: from.x,
            fy: from.y,
            tx: to.x,
            ty: to.y,
        })?;
        Ok(())
    }

    fn send_keys(&mut self, text: &str) -> Result<(), DeviceError> {
        self.send_ok(&DeviceRequest::SendKeys {
            text: text.to_string(),
        })?;
        Ok(())
    }

    fn press(&mut self, key: DeviceKey) -> Result<(), DeviceError> {
        self.send_ok(&DeviceRequest::Press {
            key: key.as_str().to_string(),
        })?;
        Ok(())
    }

    fn window_size(&mut self) -> Result<(u32, u32), DeviceError> {
        let response = self.send_ok(&DeviceRequest::WindowSize)?;
        match (response.width, response.height) {
            (Some(w), Some(h)) => Ok((w, h)),
            _ => Err(Self::missing("window_size", "width/height")),
        }
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        // Best-effort quit: the bridge may already be gone
        if let Err(e) = self.send(&DeviceRequest::Quit) {
            debug!("bridge quit request failed: {}", e);
        }
        if let Err(e) = self.child.wait() {
            warn!("failed to reap device bridge: {}", e);
        }
        Ok(())
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
