pub mod operator;
pub mod organization;
pub mod preset;
pub mod sensor;
pub mod thing;
pub mod user;

pub use operator::{Operator, OperatorChanges};
pub use organization::Organization;
pub use preset::{Chart, ChartPreset, ChartPresetChanges, RawDataPreset, RawDataPresetChanges};
pub use sensor::{Sensor, SensorFields};
pub use thing::{Thing, ThingChanges};
pub use user::{User, UserChanges};
