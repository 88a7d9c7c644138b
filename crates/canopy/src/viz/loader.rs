use canopy_graph::TreeNode;
use canopy_graph::json::tree;
use std::cell::RefCell;
use std::rc::Rc;

/// Supplies subtrees that are not in the graph yet.
///
/// `level` is how many levels below `node_id` the visualization wants. The loader answers through
/// `completion`, either before returning or later; the visualization waits for every request it
/// made before it continues.
pub trait SubtreeLoader {
    fn request(&mut self, node_id: &str, level: u32, completion: Completion);
}

impl<F> SubtreeLoader for F
where
    F: FnMut(&str, u32, Completion),
{
    fn request(&mut self, node_id: &str, level: u32, completion: Completion) {
        self(node_id, level, completion)
    }
}

/// Reply handle for one [`SubtreeLoader::request`].
#[derive(Debug, Clone, Default)]
pub struct Completion {
    replies: Rc<RefCell<Vec<(String, Option<TreeNode>)>>>,
}

impl Completion {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Delivers the subtree for `node_id`, or `None` when there is nothing below it.
    pub fn complete(self, node_id: &str, data: Option<TreeNode>) {
        self.replies.borrow_mut().push((node_id.to_string(), data));
    }

    pub(crate) fn received(&self) -> usize {
        self.replies.borrow().len()
    }

    pub(crate) fn take(&self) -> Vec<(String, Option<TreeNode>)> {
        std::mem::take(&mut *self.replies.borrow_mut())
    }
}

/// Serves subtrees out of a complete tree held in memory, pruned to the requested depth.
#[derive(Debug, Clone)]
pub struct TreeSource {
    tree: TreeNode,
}

impl TreeSource {
    pub fn new(tree: TreeNode) -> Self {
        Self { tree }
    }

    /// The top `levels` levels of the tree, for the initial load.
    pub fn head(&self, levels: usize) -> TreeNode {
        let mut head = self.tree.clone();
        tree::prune(&mut head, levels);
        head
    }
}

impl SubtreeLoader for TreeSource {
    fn request(&mut self, node_id: &str, level: u32, completion: Completion) {
        let data = tree::subtree(&self.tree, node_id).map(|found| {
            let mut sub = found.clone();
            tree::prune(&mut sub, level as usize);
            sub
        });
        tracing::trace!(node_id, level, found = data.is_some(), "serve subtree");
        completion.complete(node_id, data);
    }
}
