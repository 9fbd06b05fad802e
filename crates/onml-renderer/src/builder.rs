//! Turns declarative nodes into host records.

use crate::element::{Attributes, Children, Props};
use crate::node::{IdAllocator, Instance, TextInstance, UpdatePayload};

/// Host-facing attributes kept on an instance. Only `prop` lives in its own
/// field, so nothing is kept here unless retention is on.
pub fn host_attributes(props: &Props, retain_attributes: bool) -> Attributes {
    if retain_attributes {
        props.attributes().clone()
    } else {
        Attributes::new()
    }
}

pub fn create_instance(
    ids: &mut IdAllocator,
    kind: &str,
    props: &Props,
    retain_attributes: bool,
) -> Instance {
    Instance {
        id: ids.allocate(),
        kind: kind.into(),
        children: Default::default(),
        prop: props.prop().clone(),
        attributes: host_attributes(props, retain_attributes),
    }
}

pub fn create_text_instance(ids: &mut IdAllocator, text: &str) -> TextInstance {
    TextInstance {
        id: ids.allocate(),
        text: text.into(),
    }
}

/// Whether `children` is plain string/number content rather than a sub-tree
pub fn should_set_text_content(props: &Props) -> bool {
    matches!(props.children(), Children::Text(_))
}

pub fn should_deprioritize_subtree(_kind: &str, props: &Props) -> bool {
    props.is_hidden()
}

/// Every revisit of an instance counts as dirty; props are never compared.
pub fn prepare_update(
    _instance: &Instance,
    props: &Props,
    retain_attributes: bool,
) -> Option<UpdatePayload> {
    Some(UpdatePayload {
        prop: props.prop().clone(),
        attributes: host_attributes(props, retain_attributes),
    })
}

/// Instances never ask for a `commit_mount` pass.
pub fn finalize_initial_children(_instance: &Instance, _kind: &str, _props: &Props) -> bool {
    false
}
