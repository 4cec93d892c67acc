//! Registry mapping node-kind keywords to constructors.
//!
//! The graph builder consults this when it meets an attribute keyword; an
//! unregistered keyword that no plugin rewrote is an unknown build rule.
//! Extension kinds register through [`NodeBuilderSet::register`].

use std::collections::HashMap;
use std::rc::Rc;

use crate::core::target::TargetInfo;
use crate::input::Input;
use crate::nodes::autoconf::AutoconfNode;
use crate::nodes::cc_binary::CCBinaryNode;
use crate::nodes::cc_library::CCLibraryNode;
use crate::nodes::cmake::CmakeNode;
use crate::nodes::config::ConfigNode;
use crate::nodes::gen_sh::GenShNode;
use crate::nodes::make::MakeNode;
use crate::nodes::plugin::PluginNode;
use crate::nodes::BuildNode;

/// Constructor for one node kind.
pub type NodeFactory = fn(TargetInfo, Rc<Input>) -> Box<dyn BuildNode>;

pub struct NodeBuilderSet {
    builders: HashMap<String, NodeFactory>,
}

impl NodeBuilderSet {
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// The full built-in vocabulary.
    pub fn default_set() -> Self {
        let mut set = Self::new();
        set.register("cc_library", |t, i| Box::new(CCLibraryNode::new(t, i)));
        set.register("cc_binary", |t, i| Box::new(CCBinaryNode::new(t, i)));
        set.register("cmake", |t, i| Box::new(CmakeNode::new(t, i)));
        set.register("autoconf", |t, i| Box::new(AutoconfNode::new(t, i)));
        set.register("gen_sh", |t, i| Box::new(GenShNode::new(t, i)));
        set.register("make", |t, i| Box::new(MakeNode::new(t, i)));
        set.register("config", |t, i| Box::new(ConfigNode::new(t, i)));
        set.register("plugin", |t, i| Box::new(PluginNode::new(t, i)));
        set
    }

    pub fn register(&mut self, key: impl Into<String>, factory: NodeFactory) {
        self.builders.insert(key.into(), factory);
    }

    /// Constructs a fresh node of the registered kind, or `None` for an
    /// unknown keyword (the caller reports it with file context).
    pub fn new_node(
        &self,
        key: &str,
        target: TargetInfo,
        input: Rc<Input>,
    ) -> Option<Box<dyn BuildNode>> {
        self.builders.get(key).map(|factory| factory(target, input))
    }
}

impl Default for NodeBuilderSet {
    fn default() -> Self {
        Self::default_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_covers_builtin_kinds() {
        let set = NodeBuilderSet::default_set();
        let input = Rc::new(Input::new(".", ".gen-obj", ".gen-files"));
        for kind in [
            "cc_library",
            "cc_binary",
            "cmake",
            "autoconf",
            "gen_sh",
            "make",
            "config",
            "plugin",
        ] {
            let target = TargetInfo::from_full_path("//d:x").unwrap();
            let node = set.new_node(kind, target, Rc::clone(&input)).unwrap();
            assert_eq!(node.kind(), kind);
        }
    }

    #[test]
    fn unknown_keyword_yields_none() {
        let set = NodeBuilderSet::default_set();
        let input = Rc::new(Input::new(".", ".gen-obj", ".gen-files"));
        let target = TargetInfo::from_full_path("//d:x").unwrap();
        assert!(set.new_node("go_library", target, input).is_none());
    }
}
