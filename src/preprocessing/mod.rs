/// Модуль предобработки данных

pub mod cleaning;
pub mod normalization;

pub use normalization::StandardScaler;
