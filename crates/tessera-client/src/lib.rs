//! Client side of the pipeline: a session that decodes the play-state stream
//! into the world cache and meshes it, the camera the server steers, a
//! headless mesh store, and the drivers that feed bytes in.

pub mod camera;
pub mod driver;
pub mod headless;
pub mod reload;
pub mod session;


pub use camera::{EYE_HEIGHT, ViewCamera};
pub use driver::{DriveSummary, DriverError, replay, run_connected};
pub use headless::{HeadlessMeshStore, StoredMesh};
pub use reload::{ConfigReloader, RELOAD_PERIOD};
pub use session::{ProcessSummary, Session, SessionError, SessionStats};
