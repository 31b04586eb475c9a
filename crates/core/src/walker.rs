use tracing::{debug, trace};

use crate::node_info::NodeInfo;
use crate::path::{hier_line, SingleBuilder, TripleBuilder};
use crate::record::{CoverKind, CoverRecord, DbEvent, DbVendor};
use crate::top_tree::{SelectSet, TopTree};

enum Vendor {
  Triple(TripleBuilder),
  Single(SingleBuilder),
}

#[derive(Default)]
struct DuState {
  under_du: bool,
  subscope_depth: u32,
}

struct BufferedBlock {
  record: CoverRecord,
  scope: String,
  line: u32,
  select: SelectSet,
}

enum Built {
  Triple([String; 3], NodeInfo),
  Single(String, NodeInfo),
}

/// Streams database events against a [`TopTree`].
///
/// The walker tracks whether the traversal is underneath a design unit
/// (records there are shared by every sibling instance and must hit the DU
/// tree), buffers block-shaped records per scope so they can be re-emitted
/// in source order, and assigns repeat indices to vector covergroup bins.
/// One walker handles one database; the tree accumulates across walkers.
pub struct Walker<'t> {
  tree: &'t mut TopTree,
  vendor: Vendor,
  refinement: bool,
  du: DuState,
  blocks: Vec<BufferedBlock>,
  last_cvg_key: String,
  cvg_repeat: u32,
}

impl<'t> Walker<'t> {
  pub fn new(tree: &'t mut TopTree, vendor: DbVendor, refinement: bool) -> Self {
    let vendor = match vendor {
      DbVendor::Triple => Vendor::Triple(TripleBuilder::default()),
      DbVendor::Single => Vendor::Single(SingleBuilder::default()),
    };
    Self {
      tree,
      vendor,
      refinement,
      du: DuState::default(),
      blocks: Vec::new(),
      last_cvg_key: String::new(),
      cvg_repeat: 0,
    }
  }

  pub fn on_event(&mut self, event: DbEvent) {
    match event {
      DbEvent::InitDb => {}
      DbEvent::Du => {
        self.drain_blocks();
        self.du.under_du = true;
        self.du.subscope_depth = 0;
      }
      DbEvent::Scope => {
        self.drain_blocks();
        if self.du.under_du {
          self.du.subscope_depth += 1;
        }
      }
      DbEvent::EndScope => {
        self.drain_blocks();
        if self.du.under_du {
          if self.du.subscope_depth > 0 {
            self.du.subscope_depth -= 1;
          } else {
            self.du.under_du = false;
          }
        }
      }
      DbEvent::Item(record) => self.on_item(record),
      DbEvent::EndDb => self.drain_blocks(),
    }
  }

  /// The select mask for the current position: under a design unit only
  /// the DU tree can match (INST_ONCE shares the data among siblings),
  /// outside of one only the instance tree makes sense.
  fn select(&self) -> SelectSet {
    if self.du.under_du {
      SelectSet::DU
    } else {
      SelectSet::INSTANCE
    }
  }

  fn on_item(&mut self, record: CoverRecord) {
    if record.kind == CoverKind::Toggle {
      return;
    }
    if !record.kind.is_code_cov()
      && !matches!(record.kind, CoverKind::CvgBin | CoverKind::AssertBin)
    {
      return;
    }
    if record.name.is_empty() {
      return;
    }

    if record.kind.is_block_shaped() {
      self.buffer_block(record);
      return;
    }

    let is_cvg = record.kind == CoverKind::CvgBin;
    let select = if matches!(record.kind, CoverKind::CvgBin | CoverKind::AssertBin) {
      SelectSet::INSTANCE
    } else {
      self.select()
    };

    let built = match &mut self.vendor {
      Vendor::Triple(builder) => builder.build(&record).map(|(k, i)| Built::Triple(k, i)),
      Vendor::Single(builder) => builder
        .build(&record, self.refinement)
        .map(|(k, i)| Built::Single(k, i)),
    };
    let Some(built) = built else {
      trace!(name = record.name.as_str(), "record without a key, skipped");
      return;
    };

    match built {
      Built::Triple(mut keys, info) => {
        if is_cvg && !keys[0].is_empty() {
          keys[0] = self.repeat_indexed(std::mem::take(&mut keys[0]));
        }
        self.tree.run_triple(&keys, record.hits, &info);
      }
      Built::Single(mut key, info) => {
        if is_cvg {
          key = self.repeat_indexed(key);
        }
        self.tree.run_single(&key, record.hits, &info, select);
      }
    }
  }

  /// Vector covergroup bins arrive as consecutive records with the same
  /// key; each occurrence gets the next repeat index, a key change resets
  /// the count.
  fn repeat_indexed(&mut self, key: String) -> String {
    if key == self.last_cvg_key {
      self.cvg_repeat += 1;
    } else {
      self.cvg_repeat = 0;
      self.last_cvg_key = key.clone();
    }
    let base = key.strip_suffix("v/").unwrap_or(&key);
    format!("{base}{}/v/", self.cvg_repeat)
  }

  fn buffer_block(&mut self, record: CoverRecord) {
    let (scope, line) = match &self.vendor {
      Vendor::Single(_) => {
        let scope = record.hier.split('#').next().unwrap_or("").to_string();
        (scope, hier_line(&record.hier))
      }
      Vendor::Triple(_) => (record.hier.clone(), record.line),
    };
    // records of a new scope flush the previous one even without an
    // explicit scope event
    if self.blocks.last().is_some_and(|b| b.scope != scope) {
      self.drain_blocks();
    }
    let select = self.select();
    self.blocks.push(BufferedBlock {
      record,
      scope,
      line,
      select,
    });
  }

  /// Re-emits the buffered blocks of the finished scope. See [`reorder`]
  /// for the ordering rule; in refinement mode the emitted index is the
  /// 1-based arrival position of that order, otherwise the block's own
  /// source line.
  fn drain_blocks(&mut self) {
    if self.blocks.is_empty() {
      return;
    }
    let blocks = std::mem::take(&mut self.blocks);
    let lines: Vec<u32> = blocks.iter().map(|b| b.line).collect();
    let order = reorder(&lines);
    debug!(count = blocks.len(), "draining block buffer");
    let mut running = 0u32;
    for idx in order {
      let blk = &blocks[idx];
      running += 1;
      let line_token = if self.refinement { running } else { blk.line };
      match &self.vendor {
        Vendor::Single(_) => {
          let (key, info) = SingleBuilder::block_key(&blk.record, line_token);
          self.tree.run_single(&key, blk.record.hits, &info, blk.select);
        }
        Vendor::Triple(builder) => {
          let (keys, info) = builder.build_block(&blk.record, line_token);
          self.tree.run_triple(&keys, blk.record.hits, &info);
        }
      }
    }
  }
}

/// The stable emission order for one scope's blocks.
///
/// Scanning in arrival order, each block gets `min_line = min(its line,
/// previous min_line)`; a decrease opens a new chunk. Chunks are then
/// sorted by `min_line` ascending and emitted chunk by chunk in arrival
/// order, which maps the vendor's emission order back onto source order.
fn reorder(lines: &[u32]) -> Vec<usize> {
  let Some(&first) = lines.first() else {
    return Vec::new();
  };
  let mut chunks: Vec<(usize, u32)> = vec![(0, first)];
  let mut min_line = first;
  for (i, &line) in lines.iter().enumerate().skip(1) {
    if line <= min_line {
      min_line = line;
      chunks.push((i, line));
    }
  }
  let mut bounded: Vec<(usize, usize, u32)> = Vec::with_capacity(chunks.len());
  for (c, &(start, min)) in chunks.iter().enumerate() {
    let end = chunks.get(c + 1).map_or(lines.len(), |next| next.0);
    bounded.push((start, end, min));
  }
  bounded.sort_by_key(|&(_, _, min)| min);
  let mut order = Vec::with_capacity(lines.len());
  for (start, end, _) in bounded {
    order.extend(start..end);
  }
  order
}
