// SPDX-License-Identifier: MIT OR Apache-2.0
//! Surface parameters, stored on the root context.

use super::Surface;
use crate::context::{ContextId, ContextKey};
use crate::error::{Result, SurfaceError};
use crate::events::SurfaceEvent;
use crate::parameter::{unique_parameter_name, SurfaceParameter};
use crate::undo::UndoAction;
use crate::value::Value;
use uuid::Uuid;

impl Surface {
    /// Parameters of the root graph
    pub fn parameters(&self) -> &[SurfaceParameter] {
        self.root
            .and_then(|root| self.contexts.get(&root))
            .map_or(&[], |root| root.parameters())
    }

    /// Parameter by ID
    pub fn find_parameter(&self, id: Uuid) -> Option<&SurfaceParameter> {
        self.parameters().iter().find(|p| p.id == id)
    }

    /// Add a parameter; a taken name gets a numeric suffix
    pub fn add_parameter(&mut self, mut parameter: SurfaceParameter) -> Result<Uuid> {
        let (root, key) = self.root_key()?;
        let ctx = self.ctx(root)?;
        if ctx.find_parameter(parameter.id).is_some() {
            parameter.id = Uuid::new_v4();
        }
        parameter.name = unique_parameter_name(ctx.parameters(), &parameter.name);
        let index = ctx.parameters().len();
        let id = parameter.id;
        tracing::debug!("Adding parameter '{}' ({})", parameter.name, id);

        self.insert_parameter(index, parameter.clone())?;
        self.record(UndoAction::AddRemoveParameter {
            root: key,
            parameter,
            index,
            added: true,
        });
        Ok(id)
    }

    /// Remove a parameter; getters referencing it fall back to `Null`
    pub fn remove_parameter(&mut self, id: Uuid) -> Result<()> {
        let (_, key) = self.root_key()?;
        let (index, parameter) = self.take_parameter(id)?;
        self.record(UndoAction::AddRemoveParameter {
            root: key,
            parameter,
            index,
            added: false,
        });
        Ok(())
    }

    /// Rename a parameter; returns the name actually applied
    pub fn rename_parameter(&mut self, id: Uuid, name: &str) -> Result<String> {
        let (root, key) = self.root_key()?;
        let ctx = self.ctx(root)?;
        let current = ctx
            .find_parameter(id)
            .ok_or(SurfaceError::ParameterNotFound(id))?;
        let before = current.name.clone();
        let others: Vec<SurfaceParameter> = ctx
            .parameters()
            .iter()
            .filter(|p| p.id != id)
            .cloned()
            .collect();
        let after = unique_parameter_name(&others, name);
        if after == before {
            return Ok(after);
        }

        self.set_parameter_name(id, after.clone())?;
        self.record(UndoAction::RenameParameter {
            root: key,
            id,
            before,
            after: after.clone(),
        });
        Ok(after)
    }

    /// Change the value of a parameter; the value kind must not change
    pub fn set_parameter_value(&mut self, id: Uuid, value: Value) -> Result<()> {
        let (root, key) = self.root_key()?;
        let current = self
            .ctx(root)?
            .find_parameter(id)
            .ok_or(SurfaceError::ParameterNotFound(id))?;
        if !current.value.same_kind(&value) {
            return Err(SurfaceError::ParameterValueType(id));
        }
        if current.value == value {
            return Ok(());
        }
        let before = self.replace_parameter_value(id, value.clone())?;
        self.record(UndoAction::EditParameter {
            root: key,
            id,
            before,
            after: value,
        });
        Ok(())
    }

    fn root_key(&self) -> Result<(ContextId, ContextKey)> {
        let root = self.root.ok_or(SurfaceError::NoRoot)?;
        Ok((root, self.ctx(root)?.key().clone()))
    }

    fn parameters_changed(&mut self, root: ContextId, id: Uuid) {
        self.emit(SurfaceEvent::ParametersChanged { parameter: id });
        self.mark_as_modified(root, true);
        self.refresh_parameter_getters();
    }

    // Unrecorded edits, shared by the public operations and undo replay

    pub(crate) fn insert_parameter(&mut self, index: usize, parameter: SurfaceParameter) -> Result<()> {
        let root = self.root.ok_or(SurfaceError::NoRoot)?;
        let id = parameter.id;
        let parameters = &mut self.ctx_mut(root)?.parameters;
        parameters.insert(index.min(parameters.len()), parameter);
        self.parameters_changed(root, id);
        Ok(())
    }

    pub(crate) fn take_parameter(&mut self, id: Uuid) -> Result<(usize, SurfaceParameter)> {
        let root = self.root.ok_or(SurfaceError::NoRoot)?;
        let parameters = &mut self.ctx_mut(root)?.parameters;
        let index = parameters
            .iter()
            .position(|p| p.id == id)
            .ok_or(SurfaceError::ParameterNotFound(id))?;
        let parameter = parameters.remove(index);
        self.parameters_changed(root, id);
        Ok((index, parameter))
    }

    pub(crate) fn set_parameter_name(&mut self, id: Uuid, name: String) -> Result<()> {
        let root = self.root.ok_or(SurfaceError::NoRoot)?;
        let parameter = self
            .ctx_mut(root)?
            .parameters
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SurfaceError::ParameterNotFound(id))?;
        parameter.name = name;
        self.parameters_changed(root, id);
        Ok(())
    }

    pub(crate) fn replace_parameter_value(&mut self, id: Uuid, value: Value) -> Result<Value> {
        let root = self.root.ok_or(SurfaceError::NoRoot)?;
        let parameter = self
            .ctx_mut(root)?
            .parameters
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(SurfaceError::ParameterNotFound(id))?;
        let before = std::mem::replace(&mut parameter.value, value);
        self.parameters_changed(root, id);
        Ok(before)
    }
}
