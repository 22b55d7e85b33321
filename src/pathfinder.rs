//! Grid search: A* for the planner, plain frontier search for ghosts.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};

use crate::grid::{Dir, Grid, Pos};

/// Cells from (excluding) a start to (including) a goal. Empty when there is
/// no route or the start already is the goal.
pub type Path = Vec<Pos>;

/// Neighbor expansion order shared by every search.
const SEARCH_ORDER: [Dir; 4] = [Dir::Down, Dir::Right, Dir::Up, Dir::Left];

#[derive(Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f: usize,
    seq: u64,
    g: usize,
    pos: Pos,
}

// Reversed so `BinaryHeap` pops the lowest f first, earliest insertion on ties.
impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* over 4-connected walkable cells with a Manhattan heuristic.
///
/// Cells in `blocked` are treated as walls for this query only.
pub fn find_path(grid: &Grid, start: Pos, goal: Pos, blocked: &HashSet<Pos>) -> Path {
    if start == goal
        || !grid.in_bounds(start)
        || !grid.is_walkable(goal)
        || blocked.contains(&goal)
    {
        return Path::new();
    }

    let cells = grid.width() * grid.height();
    let mut g_score = vec![usize::MAX; cells];
    let mut came_from: Vec<Option<Pos>> = vec![None; cells];
    let mut open = BinaryHeap::new();
    let mut seq = 0u64;

    g_score[grid.index(start)] = 0;
    open.push(OpenNode {
        f: start.manhattan(goal),
        seq,
        g: 0,
        pos: start,
    });

    while let Some(OpenNode { g, pos, .. }) = open.pop() {
        if pos == goal {
            return reconstruct(grid, &came_from, start, goal);
        }
        if g > g_score[grid.index(pos)] {
            continue;
        }
        for dir in SEARCH_ORDER {
            let Some(next) = grid.neighbor(pos, dir) else {
                continue;
            };
            if !grid.is_walkable(next) || blocked.contains(&next) {
                continue;
            }
            let tentative = g + 1;
            let idx = grid.index(next);
            if tentative < g_score[idx] {
                g_score[idx] = tentative;
                came_from[idx] = Some(pos);
                seq += 1;
                open.push(OpenNode {
                    f: tentative + next.manhattan(goal),
                    seq,
                    g: tentative,
                    pos: next,
                });
            }
        }
    }
    Path::new()
}

/// Order in which an uninformed search drains its frontier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frontier {
    /// Queue: breadth-first, shortest paths.
    Fifo,
    /// Stack: depth-first, wandering paths.
    Lifo,
}

/// Uninformed graph search; the frontier discipline picks BFS or DFS.
pub fn frontier_search(grid: &Grid, start: Pos, goal: Pos, frontier: Frontier) -> Path {
    if start == goal || !grid.in_bounds(start) {
        return Path::new();
    }

    let cells = grid.width() * grid.height();
    let mut visited = vec![false; cells];
    let mut came_from: Vec<Option<Pos>> = vec![None; cells];
    let mut open: VecDeque<(Pos, Option<Pos>)> = VecDeque::new();
    open.push_back((start, None));

    loop {
        let next = match frontier {
            Frontier::Fifo => open.pop_front(),
            Frontier::Lifo => open.pop_back(),
        };
        let Some((pos, parent)) = next else {
            break;
        };
        let idx = grid.index(pos);
        if visited[idx] {
            continue;
        }
        visited[idx] = true;
        came_from[idx] = parent;
        if pos == goal {
            return reconstruct(grid, &came_from, start, goal);
        }
        for dir in SEARCH_ORDER {
            let Some(next) = grid.neighbor(pos, dir) else {
                continue;
            };
            if grid.is_walkable(next) && !visited[grid.index(next)] {
                open.push_back((next, Some(pos)));
            }
        }
    }
    Path::new()
}

/// Every walkable cell reachable from `start`, `start` included.
pub fn reachable(grid: &Grid, start: Pos) -> HashSet<Pos> {
    let mut seen = HashSet::new();
    if !grid.in_bounds(start) {
        return seen;
    }
    let mut q = VecDeque::new();
    seen.insert(start);
    q.push_back(start);
    while let Some(pos) = q.pop_front() {
        for dir in SEARCH_ORDER {
            let Some(next) = grid.neighbor(pos, dir) else {
                continue;
            };
            if grid.is_walkable(next) && seen.insert(next) {
                q.push_back(next);
            }
        }
    }
    seen
}

fn reconstruct(grid: &Grid, came_from: &[Option<Pos>], start: Pos, goal: Pos) -> Path {
    let mut path = Path::new();
    let mut current = goal;
    while current != start {
        path.push(current);
        match came_from[grid.index(current)] {
            Some(prev) => current = prev,
            None => break,
        }
    }
    path.reverse();
    path
}
