pub(crate) mod doc;
pub(crate) mod format;
pub(crate) mod history;
pub(crate) mod prefs;
pub(crate) mod transaction;
