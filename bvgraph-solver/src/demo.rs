//! Shortest paths with bitvector edge weights tied together by addition
//!
//! A 4-node graph with edges `0→1`, `0→2`, `1→2` and `2→3` weighted by the
//! 4-bit bitvectors `w1..w4`. `d1` is pinned to the exact distance from 0 to
//! 3 and `d2` to the exact distance from 1 to 3, then `d1 + d2 == 10` and
//! `d2 > 4` are asserted.

use bvgraph_core::Result;
use bvgraph_theories::{BvId, Comparison};

use crate::context::Context;

/// Width of every bitvector of the problem.
pub const WIDTH: u32 = 4;

/// Handles of the encoded problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightsAdd {
    /// Weights of the edges `0→1`, `0→2`, `1→2`, `2→3`.
    pub weights: [BvId; 4],
    /// Exact distance from node 0 to node 3.
    pub dist_0_3: BvId,
    /// Exact distance from node 1 to node 3.
    pub dist_1_3: BvId,
}

impl WeightsAdd {
    /// Encode the problem into `ctx`
    pub fn encode(ctx: &mut Context) -> Result<Self> {
        let mut weights = [BvId::new(0); 4];
        for w in &mut weights {
            *w = ctx.new_bv(WIDTH)?;
        }

        let g = ctx.new_graph();
        let mut nodes = Vec::with_capacity(4);
        for _ in 0..4 {
            nodes.push(ctx.add_node(g)?);
        }
        for (&(from, to), &w) in [(0, 1), (0, 2), (1, 2), (2, 3)].iter().zip(&weights) {
            let edge = ctx.add_edge_bv(g, nodes[from], nodes[to], w)?;
            ctx.assert_lit(edge)?;
        }

        let dist_0_3 = ctx.new_bv(WIDTH)?;
        let dist_1_3 = ctx.new_bv(WIDTH)?;
        for (from, dist) in [(nodes[0], dist_0_3), (nodes[1], dist_1_3)] {
            let leq = ctx.distance_leq_bv(g, from, nodes[3], dist)?;
            ctx.assert_lit(leq)?;
            let lt = ctx.distance_lt_bv(g, from, nodes[3], dist)?;
            ctx.assert_lit(!lt)?;
        }

        let sum = ctx.bv_add(dist_0_3, dist_1_3)?;
        let ten = ctx.bv_compare_const(Comparison::Eq, sum, 10)?;
        ctx.assert_lit(ten)?;
        let above_four = ctx.bv_compare_const(Comparison::Gt, dist_1_3, 4)?;
        ctx.assert_lit(above_four)?;

        Ok(Self {
            weights,
            dist_0_3,
            dist_1_3,
        })
    }

    /// All six bitvectors in declaration order.
    #[must_use]
    pub fn bitvectors(&self) -> [BvId; 6] {
        let [w1, w2, w3, w4] = self.weights;
        [w1, w2, w3, w4, self.dist_0_3, self.dist_1_3]
    }
}
