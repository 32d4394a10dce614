//! TheSkyX protocol client.
//!
//! Each logical command is one TCP round trip: a fresh connection, a
//! JavaScript fragment wrapped in fixed start/end markers, and a single-line
//! text reply. The server is stateful and cannot service interleaved command
//! streams, so every round trip runs under one mutex; concurrent callers
//! (the session task and a timer-driven cooler-power poll) take whole turns.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::error::{TheSkyXError, TheSkyXResult};

const PACKET_PREFIX: &str = "/* Java Script *//* Socket Start Packet */";
const PACKET_SUFFIX: &str = "/* Socket End Packet */";
const MAX_RECEIVE_SIZE: usize = 1024;

/// Sensor temperatures outside this range mean the reply was garbage.
const MIN_PLAUSIBLE_TEMPERATURE: f64 = -270.0;
const MAX_PLAUSIBLE_TEMPERATURE: f64 = 200.0;

/// Image type codes in TheSkyX's ccdsoftCamera scheme.
///
/// Only bias and dark frames are taken by the session engine; light and flat
/// exist in the server's numbering and are listed for completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Light = 1,
    Bias = 2,
    Dark = 3,
    Flat = 4,
}

impl ImageType {
    /// Numeric code the server expects in `ccdsoftCamera.Frame`.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Client for one TheSkyX server endpoint.
pub struct TheSkyXClient {
    host: String,
    port: u16,
    // One command/response pair on the wire at a time.
    exchange_lock: Mutex<()>,
}

impl TheSkyXClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            exchange_lock: Mutex::new(()),
        }
    }

    /// `host:port` form of the configured endpoint.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Autosave path the camera will use for image files. Doubles as a
    /// connectivity probe at session start.
    pub async fn camera_autosave_path(&self) -> TheSkyXResult<String> {
        let script = "var path=ccdsoftCamera.AutoSavePath;var Out;Out=path+\"\\n\";";
        self.send_command_with_return(script).await
    }

    /// Tell TheSkyX to connect to the camera.
    pub async fn connect_camera(&self) -> TheSkyXResult<()> {
        self.send_command_no_return("ccdsoftCamera.Connect();").await
    }

    /// Tell TheSkyX to disconnect from the camera.
    pub async fn disconnect_camera(&self) -> TheSkyXResult<()> {
        self.send_command_no_return("ccdsoftCamera.Disconnect();").await
    }

    /// Take one bias frame at the given binning. With `asynchronous` false
    /// the command does not return until the frame has downloaded, which is
    /// what download-time calibration relies on.
    pub async fn take_bias_frame(
        &self,
        binning: u32,
        auto_save: bool,
        asynchronous: bool,
    ) -> TheSkyXResult<()> {
        let script = format!(
            "ccdsoftCamera.Autoguider=false;\
             ccdsoftCamera.Asynchronous={};\
             ccdsoftCamera.Frame=2;\
             ccdsoftCamera.ImageReduction=0;\
             ccdsoftCamera.ToNewWindow=false;\
             ccdsoftCamera.ccdsoftAutoSaveAs=0;\
             ccdsoftCamera.AutoSaveOn={};\
             ccdsoftCamera.BinX={binning};\
             ccdsoftCamera.BinY={binning};\
             ccdsoftCamera.ExposureTime=0;\
             var cameraResult = ccdsoftCamera.TakeImage();",
            js_bool(asynchronous),
            js_bool(auto_save),
        );
        let reply = self.send_command_with_return(&script).await?;
        check_status_reply(&reply)
    }

    /// Switch temperature regulation on toward a target, or off. Regulation
    /// is left running across camera disconnects either way.
    pub async fn set_camera_cooling(
        &self,
        cooling_on: bool,
        target_temperature: f64,
    ) -> TheSkyXResult<()> {
        let set_point = if cooling_on {
            format!("ccdsoftCamera.TemperatureSetPoint={target_temperature};")
        } else {
            String::new()
        };
        let script = format!(
            "{set_point}ccdsoftCamera.RegulateTemperature={};\
             ccdsoftCamera.ShutDownTemperatureRegulationOnDisconnect=false;",
            js_bool(cooling_on)
        );
        self.send_command_no_return(&script).await
    }

    /// Current sensor temperature, validated into a plausible range.
    pub async fn camera_temperature(&self) -> TheSkyXResult<f64> {
        let script = "var temp=ccdsoftCamera.Temperature;var Out;Out=temp+\"\\n\";";
        let reply = self.send_command_with_return(script).await?;
        parse_float_in_range(&reply, MIN_PLAUSIBLE_TEMPERATURE, MAX_PLAUSIBLE_TEMPERATURE)
            .ok_or(TheSkyXError::InvalidTemperature(reply))
    }

    /// Thermoelectric cooler power draw in percent.
    pub async fn cooler_power(&self) -> TheSkyXResult<f64> {
        let script =
            "var power=ccdsoftCamera.ThermalElectricCoolerPower;var Out;Out=power+\"\\n\";";
        let reply = self.send_command_with_return(script).await?;
        parse_float_in_range(&reply, 0.0, 100.0).ok_or(TheSkyXError::MalformedReply(reply))
    }

    /// Configure the camera for a run of identical frames without taking one.
    /// Bias frames get zero exposure regardless of the requested length.
    pub async fn set_camera_image(
        &self,
        image_type: ImageType,
        binning: u32,
        exposure_seconds: f64,
    ) -> TheSkyXResult<()> {
        let mut script = format!(
            "ccdsoftCamera.Autoguider = false;\
             ccdsoftCamera.Frame = {};\
             ccdsoftCamera.ImageReduction = 0;\
             ccdsoftCamera.ToNewWindow=false;\
             ccdsoftCamera.AutoSaveOn=true;\
             ccdsoftCamera.Delay = 0;\
             ccdsoftCamera.BinX = {binning};\
             ccdsoftCamera.BinY = {binning};",
            image_type.code()
        );
        if image_type == ImageType::Bias {
            script.push_str("ccdsoftCamera.ExposureTime = 0;");
        } else {
            script.push_str(&format!("ccdsoftCamera.ExposureTime = {exposure_seconds};"));
        }
        self.send_command_no_return(&script).await
    }

    /// Start acquisition of one image; the command returns immediately and
    /// the exposure proceeds in the background.
    pub async fn start_exposure(&self) -> TheSkyXResult<()> {
        let script = "ccdsoftCamera.Asynchronous=true;\
                      var cameraResult = ccdsoftCamera.TakeImage();\
                      var Out;Out=cameraResult+\"\\n\";";
        let reply = self.send_command_with_return(script).await?;
        if reply == "0" {
            Ok(())
        } else {
            Err(TheSkyXError::Camera(reply))
        }
    }

    /// Whether the asynchronous exposure started earlier has finished.
    pub async fn exposure_complete(&self) -> TheSkyXResult<bool> {
        let script =
            "var complete = ccdsoftCamera.IsExposureComplete;var Out;Out=complete+\"\\n\";";
        let reply = self.send_command_with_return(script).await?;
        match reply.as_str() {
            "0" => Ok(false),
            "1" => Ok(true),
            // Anything else means the exposure went wrong on the server side,
            // e.g. the user aborted it directly in TheSkyX. The reply carries
            // an explanation, usually terminated by "|".
            other => Err(TheSkyXError::Camera(
                other.split('|').next().unwrap_or(other).to_string(),
            )),
        }
    }

    /// Abort the image acquisition in progress.
    pub async fn abort_exposure(&self) -> TheSkyXResult<()> {
        self.send_command_no_return("ccdsoftCamera.Abort();").await
    }

    async fn send_command_with_return(&self, script: &str) -> TheSkyXResult<String> {
        self.send_command_packet(script).await
    }

    // The server replies to every packet; the reply line is read and
    // discarded for commands whose result carries no information.
    async fn send_command_no_return(&self, script: &str) -> TheSkyXResult<()> {
        self.send_command_packet(script).await.map(|_| ())
    }

    /// One full round trip: fresh connection, framed packet out, first reply
    /// line back.
    async fn send_command_packet(&self, script: &str) -> TheSkyXResult<String> {
        let packet = format!("{PACKET_PREFIX}{script}{PACKET_SUFFIX}");
        let address = self.address();

        let _guard = self.exchange_lock.lock().await;
        trace!(%address, %script, "sending command packet");

        let mut stream =
            TcpStream::connect(&address)
                .await
                .map_err(|err| TheSkyXError::ConnectionFailed {
                    address: address.clone(),
                    cause: err.to_string(),
                })?;
        stream
            .write_all(packet.as_bytes())
            .await
            .map_err(|err| TheSkyXError::Transport(err.to_string()))?;

        let mut buffer = vec![0u8; MAX_RECEIVE_SIZE];
        let mut filled = 0;
        loop {
            if filled == buffer.len() {
                break;
            }
            let count = stream
                .read(&mut buffer[filled..])
                .await
                .map_err(|err| TheSkyXError::Transport(err.to_string()))?;
            if count == 0 {
                break;
            }
            filled += count;
            if buffer[..filled].contains(&b'\n') {
                break;
            }
        }

        let raw = String::from_utf8_lossy(&buffer[..filled]);
        let line = raw
            .lines()
            .next()
            .unwrap_or("")
            .trim_end_matches('\r')
            .to_string();
        if line.is_empty() {
            return Err(TheSkyXError::EmptyReply);
        }
        debug!(reply = %line, "received reply");
        Ok(line)
    }
}

/// Boolean literal in the form the server's scripting dialect expects.
fn js_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Replies of the form `status|detail`; a leading "0" token is success.
fn check_status_reply(reply: &str) -> TheSkyXResult<()> {
    let status = reply.split('|').next().unwrap_or(reply);
    if status == "0" {
        Ok(())
    } else {
        Err(TheSkyXError::Camera(status.to_string()))
    }
}

fn parse_float_in_range(text: &str, min: f64, max: f64) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    (value >= min && value <= max).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_bool_literals() {
        assert_eq!(js_bool(true), "true");
        assert_eq!(js_bool(false), "false");
    }

    #[test]
    fn test_image_type_codes() {
        assert_eq!(ImageType::Light.code(), 1);
        assert_eq!(ImageType::Bias.code(), 2);
        assert_eq!(ImageType::Dark.code(), 3);
        assert_eq!(ImageType::Flat.code(), 4);
    }

    #[test]
    fn test_check_status_reply() {
        assert!(check_status_reply("0").is_ok());
        assert!(check_status_reply("0|extra detail").is_ok());
        assert_eq!(
            check_status_reply("5|Camera busy"),
            Err(TheSkyXError::Camera("5".to_string()))
        );
        assert_eq!(
            check_status_reply("TypeError: no camera"),
            Err(TheSkyXError::Camera("TypeError: no camera".to_string()))
        );
    }

    #[test]
    fn test_parse_float_in_range() {
        assert_eq!(parse_float_in_range("-15.5", -270.0, 200.0), Some(-15.5));
        assert_eq!(parse_float_in_range(" 20 ", -270.0, 200.0), Some(20.0));
        assert_eq!(parse_float_in_range("999", -270.0, 200.0), None);
        assert_eq!(parse_float_in_range("banana", -270.0, 200.0), None);
        assert_eq!(parse_float_in_range("", -270.0, 200.0), None);
    }

    #[test]
    fn test_address_format() {
        let client = TheSkyXClient::new("localhost", 3040);
        assert_eq!(client.address(), "localhost:3040");
    }
}
