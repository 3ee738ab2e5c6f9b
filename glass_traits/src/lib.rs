pub mod clock;

pub use clock::{Clock, MonotonicClock};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A presence radar that yields one frame of raw targets per poll.
///
/// The wire decoder behind this trait paces the caller: `poll_frame` blocks
/// until the next frame is available. `Err` means the frame could not be
/// read (communication fault); `Ok(vec![])` is a valid empty frame.
pub trait FrameSource {
    /// Raw target tuple as decoded from the wire. Equality is the target's
    /// identity: a frozen sensor repeats an equal tuple frame after frame.
    type Target: PartialEq + Clone;

    fn poll_frame(&mut self) -> Result<Vec<Self::Target>, BoxError>;

    /// Distance from the sensor in millimetres (>= 0).
    fn distance(&self, target: &Self::Target) -> f64;

    /// Signed bearing in degrees, 0 straight ahead.
    fn angle(&self, target: &Self::Target) -> f64;

    /// Bytes received but not yet decoded, for diagnostics.
    fn pending_bytes(&self) -> usize {
        0
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    type Target = S::Target;

    fn poll_frame(&mut self) -> Result<Vec<Self::Target>, BoxError> {
        (**self).poll_frame()
    }

    fn distance(&self, target: &Self::Target) -> f64 {
        (**self).distance(target)
    }

    fn angle(&self, target: &Self::Target) -> f64 {
        (**self).angle(target)
    }

    fn pending_bytes(&self) -> usize {
        (**self).pending_bytes()
    }
}

/// Logic level of a drive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Digital output lines driving the glass film's H-bridge.
pub trait OutputLines {
    fn set_line(&mut self, pin: u8, level: Level) -> Result<(), BoxError>;
}

impl<L: OutputLines + ?Sized> OutputLines for Box<L> {
    fn set_line(&mut self, pin: u8, level: Level) -> Result<(), BoxError> {
        (**self).set_line(pin, level)
    }
}

/// One target as reported by a planar presence radar: cartesian position
/// relative to the sensor plus speed and resolution, all as decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawTarget {
    /// Lateral offset in mm (negative = left).
    pub x_mm: i32,
    /// Forward distance in mm.
    pub y_mm: i32,
    pub speed_cm_s: i32,
    pub resolution_mm: u32,
}

impl RawTarget {
    pub fn new(x_mm: i32, y_mm: i32) -> Self {
        Self {
            x_mm,
            y_mm,
            ..Self::default()
        }
    }

    /// Build a target at `distance_mm` and `angle_deg` (0 = straight ahead).
    pub fn from_polar(distance_mm: f64, angle_deg: f64) -> Self {
        let rad = angle_deg.to_radians();
        Self::new(
            (distance_mm * rad.sin()).round() as i32,
            (distance_mm * rad.cos()).round() as i32,
        )
    }

    pub fn distance_mm(&self) -> f64 {
        f64::from(self.x_mm).hypot(f64::from(self.y_mm))
    }

    pub fn angle_deg(&self) -> f64 {
        f64::from(self.x_mm).atan2(f64::from(self.y_mm)).to_degrees()
    }
}
