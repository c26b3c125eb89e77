//! Design walking through an overridable listener.
//!
//! SystemVerilog IR has many node variants sharing behavior; instead of a
//! class-hierarchy visitor, passes implement [`Listener`] and override only
//! the callbacks they care about. The default methods dispatch on the
//! entity's tag and do nothing, so a pass pays only for what it overrides.

use crate::pipeline::Compiler;
use veril_ir::{ComponentId, Design, InstanceId, SignalDecl};

/// Callbacks invoked while walking the elaborated design.
///
/// All methods have do-nothing defaults.
pub trait Listener {
    /// Called entering an instance, before its definition's contents.
    fn enter_instance(&mut self, design: &Design, id: InstanceId) {
        let _ = (design, id);
    }

    /// Called leaving an instance, after all of its children.
    fn leave_instance(&mut self, design: &Design, id: InstanceId) {
        let _ = (design, id);
    }

    /// Called once per distinct component definition encountered.
    fn enter_component(&mut self, design: &Design, id: ComponentId) {
        let _ = (design, id);
    }

    /// Called for each port and signal of an entered component.
    fn on_signal(&mut self, design: &Design, comp: ComponentId, signal: &SignalDecl) {
        let _ = (design, comp, signal);
    }
}

/// Walks the elaborated instance tree depth-first, invoking the listener.
pub fn walk(compiler: &Compiler, listener: &mut dyn Listener) {
    let design = &compiler.design;
    let mut seen_components = std::collections::HashSet::new();
    for &top in &design.instances.tops {
        walk_instance(design, top, listener, &mut seen_components);
    }
}

fn walk_instance(
    design: &Design,
    inst: InstanceId,
    listener: &mut dyn Listener,
    seen: &mut std::collections::HashSet<ComponentId>,
) {
    listener.enter_instance(design, inst);
    if let Some(def) = design.instances.get(inst).definition {
        if seen.insert(def) {
            listener.enter_component(design, def);
            let comp = design.component(def);
            for sig in comp.ports.iter().chain(comp.signals.iter()) {
                listener.on_signal(design, def, sig);
            }
        }
    }
    let children = design.instances.get(inst).children.clone();
    for c in children {
        walk_instance(design, c, listener, seen);
    }
    listener.leave_instance(design, inst);
}
