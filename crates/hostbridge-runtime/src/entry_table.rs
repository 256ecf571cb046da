//! The managed entry table.
//!
//! The managed side hands this table to [`BridgeContext::initialize`]; it
//! maps every entry id to the managed bridge function native code calls
//! through. The generated managed artifact builds the same table from its
//! bridge classes.
//!
//! [`BridgeContext::initialize`]: crate::BridgeContext::initialize

use hostbridge_core::{BindingModel, EntryId, ManagedException, MarshalError};
use rustc_hash::FxHashMap;

use crate::call_frame::CallFrame;
use crate::native_fn::ManagedFn;

#[derive(Debug, Clone, Default)]
pub struct ManagedEntryTable {
    functions: FxHashMap<EntryId, ManagedFn>,
}

impl ManagedEntryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: EntryId, function: ManagedFn) -> Option<ManagedFn> {
        self.functions.insert(entry, function)
    }

    /// Bind a managed function to the entry with the given symbol, e.g.
    /// `Logger.Log(string)`.
    pub fn bind<F>(&mut self, model: &BindingModel, symbol: &str, f: F) -> Result<EntryId, MarshalError>
    where
        F: Fn(&mut CallFrame<'_>) -> Result<(), ManagedException> + Send + Sync + 'static,
    {
        let entry = model
            .entry_by_symbol(symbol)
            .ok_or_else(|| MarshalError::UnboundEntry(symbol.to_string()))?;
        self.functions.insert(entry.id, ManagedFn::new(f));
        Ok(entry.id)
    }

    pub fn get(&self, entry: EntryId) -> Option<&ManagedFn> {
        self.functions.get(&entry)
    }

    pub fn contains(&self, entry: EntryId) -> bool {
        self.functions.contains_key(&entry)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.functions.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbridge_core::{MemberDescriptor, ParamDescriptor, TypeDescriptor, TypeRef, TypeShape};

    fn model() -> BindingModel {
        let logger = TypeDescriptor::new("Logger", TypeShape::Class).with_member(MemberDescriptor::method(
            "Log",
            vec![ParamDescriptor::new("message", TypeRef::String)],
            TypeRef::Void,
        ));
        BindingModel::new(vec![logger], Vec::new())
    }

    #[test]
    fn bind_by_symbol() {
        let model = model();
        let mut table = ManagedEntryTable::new();
        let id = table.bind(&model, "Logger.Log(string)", |_| Ok(())).unwrap();
        assert!(table.contains(id));
        assert_eq!(table.len(), 1);
        assert_eq!(model.entry(id).unwrap().symbol, "Logger.Log(string)");
    }

    #[test]
    fn unknown_symbol() {
        let model = model();
        let mut table = ManagedEntryTable::new();
        let err = table.bind(&model, "Logger.Warn(string)", |_| Ok(())).unwrap_err();
        assert_eq!(err, MarshalError::UnboundEntry("Logger.Warn(string)".to_string()));
        assert!(table.is_empty());
    }
}
