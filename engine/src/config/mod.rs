pub mod settings;

pub use settings::ReportSettings;
