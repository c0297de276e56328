// consensus/src/fork.rs

use chain_core::{BlockId, BlockNumber, ChainError, ChainResult, SignedBlock};
use std::collections::{BTreeMap, HashMap};

/// In-memory DAG of candidate blocks that are not yet irreversible.
///
/// The index is bounded: blocks deeper than `max_size` below the best tip
/// are pruned, which also bounds how deep a reorganization can reach.
pub struct ForkDatabase {
    index: HashMap<BlockId, SignedBlock>,
    by_number: BTreeMap<BlockNumber, Vec<BlockId>>,
    head: Option<BlockId>,
    max_size: u64,
}

impl ForkDatabase {
    pub fn new(max_size: u64) -> Self {
        Self {
            index: HashMap::new(),
            by_number: BTreeMap::new(),
            head: None,
            max_size,
        }
    }

    pub fn head(&self) -> Option<&SignedBlock> {
        self.head.as_ref().and_then(|id| self.index.get(id))
    }

    pub fn set_head(&mut self, id: BlockId) {
        self.head = Some(id);
    }

    pub fn fetch_block(&self, id: &BlockId) -> Option<&SignedBlock> {
        self.index.get(id)
    }

    /// All candidate blocks at one height (more than one means a fork)
    pub fn fetch_blocks_by_number(&self, number: BlockNumber) -> Vec<&SignedBlock> {
        self.by_number
            .get(&number)
            .map(|ids| ids.iter().filter_map(|id| self.index.get(id)).collect())
            .unwrap_or_default()
    }

    /// Insert a block and return the id of the best head afterwards.
    ///
    /// The first block ever pushed is accepted unconditionally; any later
    /// block must link to a known parent. A strictly higher block becomes
    /// the new best head; equal height never displaces the head.
    pub fn push_block(&mut self, block: SignedBlock) -> ChainResult<BlockId> {
        let id = block.id();
        if self.index.contains_key(&id) {
            return Ok(self.best_head_id());
        }

        if !self.index.is_empty() && !self.index.contains_key(&block.header.previous) {
            return Err(ChainError::UnlinkedBlock(format!(
                "block {} at height {} links to unknown parent",
                id, block.header.number
            )));
        }

        let number = block.header.number;
        self.by_number.entry(number).or_default().push(id);
        self.index.insert(id, block);

        let advance = match self.head() {
            Some(head) => number > head.header.number,
            None => true,
        };
        if advance {
            self.head = Some(id);
            self.prune();
        }

        Ok(self.best_head_id())
    }

    fn best_head_id(&self) -> BlockId {
        self.head.expect("push_block always sets a head")
    }

    /// Remove a block (used after it fails to apply)
    pub fn remove(&mut self, id: &BlockId) {
        if let Some(block) = self.index.remove(id) {
            if let Some(ids) = self.by_number.get_mut(&block.header.number) {
                ids.retain(|b| b != id);
                if ids.is_empty() {
                    self.by_number.remove(&block.header.number);
                }
            }
        }
        if self.head == Some(*id) {
            // fall back to the highest remaining block
            self.head = self
                .by_number
                .values()
                .rev()
                .flat_map(|ids| ids.iter())
                .next()
                .copied();
        }
    }

    /// Walk two tips back to their common ancestor.
    ///
    /// Returns the two branches tip-first; each ends with the block whose
    /// parent is the common ancestor. The tips themselves are included.
    pub fn fetch_branch_from(
        &self,
        first: BlockId,
        second: BlockId,
    ) -> ChainResult<(Vec<SignedBlock>, Vec<SignedBlock>)> {
        let mut first_branch = Vec::new();
        let mut second_branch = Vec::new();

        let mut walk_first = self.require(first)?;
        let mut walk_second = self.require(second)?;

        // align heights
        while walk_first.header.number > walk_second.header.number {
            first_branch.push(walk_first.clone());
            walk_first = self.require(walk_first.header.previous)?;
        }
        while walk_second.header.number > walk_first.header.number {
            second_branch.push(walk_second.clone());
            walk_second = self.require(walk_second.header.previous)?;
        }

        // descend together until the histories join
        while walk_first.id() != walk_second.id() {
            first_branch.push(walk_first.clone());
            second_branch.push(walk_second.clone());
            walk_first = self.require(walk_first.header.previous)?;
            walk_second = self.require(walk_second.header.previous)?;
        }

        Ok((first_branch, second_branch))
    }

    fn require(&self, id: BlockId) -> ChainResult<&SignedBlock> {
        self.index.get(&id).ok_or_else(|| {
            ChainError::UnlinkedBlock(format!("no common ancestor in fork index for {}", id))
        })
    }

    /// Drop blocks deeper than the retention window below the best tip
    fn prune(&mut self) {
        let head_num = match self.head() {
            Some(h) => h.header.number,
            None => return,
        };
        let cutoff = head_num.saturating_sub(self.max_size);

        let stale: Vec<BlockNumber> = self
            .by_number
            .range(..cutoff)
            .map(|(n, _)| *n)
            .collect();
        for number in stale {
            if let Some(ids) = self.by_number.remove(&number) {
                for id in ids {
                    self.index.remove(&id);
                }
            }
        }
    }
}
