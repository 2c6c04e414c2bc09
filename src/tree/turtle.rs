//! Turtle-graphics interpretation of an expanded symbol string.
//!
//! Walks the string once, left to right, maintaining a 3D turtle (position,
//! heading) plus running branch length/radius, and emits one placement
//! matrix per branch segment and per leaf. Branch state is stacked in
//! lockstep with turtle state on `[`/`]` so future grammars could decouple
//! geometry decay from pose if needed.

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::core::error::Error;
use crate::core::rng::Rng;
use crate::core::types::Result;

/// Relative jitter applied to sampled branch lengths, radii, and angles.
const JITTER: f32 = 0.15;
/// Multiplicative length decay per drawn segment.
const LENGTH_DECAY: f32 = 0.95;
/// One-shot radius decay per run of rotation operators.
const RADIUS_DECAY: f32 = 0.92;
/// Leaves render at this fraction of the configured leaf size.
const LEAF_SCALE: f32 = 0.3;

/// Parameters for one interpretation run.
#[derive(Clone, Copy, Debug)]
pub struct TreeParams {
    pub branch_length: f32,
    pub branch_radius: f32,
    /// Rotation per turn operator, radians
    pub branch_angle: f32,
    pub leaf_size: f32,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            branch_length: 1.0,
            branch_radius: 0.4,
            branch_angle: 0.5,
            leaf_size: 0.5,
        }
    }
}

/// Placement matrices produced by a turtle walk.
///
/// Order is insertion order; each entry pairs 1:1 with a draw of the base
/// mesh (tapered cylinder for branches, billboard quad for leaves).
#[derive(Clone, Debug, Default)]
pub struct TreeGeometry {
    pub branches: Vec<Mat4>,
    pub leaves: Vec<Mat4>,
}

/// Interpret an expanded symbol string into branch and leaf transforms.
///
/// The RNG is injected so a seeded generator reproduces the same tree.
/// Fails with [`Error::UnbalancedBrackets`] if a `]` pops an empty stack.
pub fn interpret(symbols: &str, params: &TreeParams, rng: &mut Rng) -> Result<TreeGeometry> {
    let mut turtle = Turtle::new(params);
    for (i, symbol) in symbols.char_indices() {
        turtle.step(symbol, i, rng)?;
    }
    Ok(turtle.finish())
}

/// Rotation operator axes and signs.
///
/// Roll is about X, turn about Z, pitch about Y; the sign convention comes
/// from the operator pairs (`/` vs `\`, `+` vs `-`, `&` vs `^`).
fn rotation_axis(symbol: char) -> Option<(Vec3, f32)> {
    match symbol {
        '/' => Some((Vec3::X, -1.0)),
        '\\' => Some((Vec3::X, 1.0)),
        '+' => Some((Vec3::Z, -1.0)),
        '-' => Some((Vec3::Z, 1.0)),
        '&' => Some((Vec3::Y, 1.0)),
        '^' => Some((Vec3::Y, -1.0)),
        _ => None,
    }
}

/// Turtle state machine. Exposed crate-internally so unit tests can drive
/// individual steps and inspect the running state.
pub(crate) struct Turtle {
    pub(crate) position: Vec4,
    pub(crate) heading: Vec4,
    pub(crate) length: f32,
    pub(crate) radius: f32,
    angle: f32,
    leaf_size: f32,
    /// Suppresses repeated radius decay within a run of rotation operators.
    pub(crate) already_turned: bool,
    turtle_stack: Vec<(Vec4, Vec4)>,
    branch_stack: Vec<(f32, f32)>,
    out: TreeGeometry,
}

impl Turtle {
    pub(crate) fn new(params: &TreeParams) -> Self {
        Self {
            position: Vec4::new(0.0, -6.0, 0.0, 1.0),
            heading: Vec4::new(0.0, 1.0, 0.0, 0.0),
            length: params.branch_length,
            radius: params.branch_radius,
            angle: params.branch_angle,
            leaf_size: params.leaf_size,
            already_turned: false,
            turtle_stack: Vec::new(),
            branch_stack: Vec::new(),
            out: TreeGeometry::default(),
        }
    }

    pub(crate) fn step(&mut self, symbol: char, index: usize, rng: &mut Rng) -> Result<()> {
        if let Some((axis, sign)) = rotation_axis(symbol) {
            let actual = rng.jitter(self.angle, self.angle * JITTER);
            let rot = Quat::from_axis_angle(axis, sign * actual);
            self.heading = (rot * self.heading.truncate()).normalize().extend(0.0);
            self.decay_radius_once();
            return Ok(());
        }

        match symbol {
            'F' => {
                self.already_turned = false;
                let len = rng.jitter(self.length, self.length * JITTER);
                let radius = rng.jitter(self.radius, self.radius * JITTER);
                let dir = self.heading.truncate();
                let midpoint = self.position.truncate() + dir * (len * 0.5);
                let transform = Mat4::from_translation(midpoint)
                    * Mat4::from_quat(heading_rotation(dir))
                    * Mat4::from_scale(Vec3::new(radius * 0.5, len, radius * 0.5));
                self.position += self.heading * len;
                self.out.branches.push(transform);
                self.length *= LENGTH_DECAY;
            }
            'L' => {
                let scale = self.leaf_size * LEAF_SCALE;
                let transform = Mat4::from_quat(heading_rotation(self.heading.truncate()))
                    * Mat4::from_scale(Vec3::new(scale, scale, 1.0));
                self.out.leaves.push(transform);
            }
            '[' => {
                self.already_turned = false;
                self.turtle_stack.push((self.position, self.heading));
                self.branch_stack.push((self.length, self.radius));
            }
            ']' => {
                // A branch tip: drop one jittered leaf before restoring state.
                self.emit_tip_leaf(rng);
                self.already_turned = false;
                let (position, heading) = self
                    .turtle_stack
                    .pop()
                    .ok_or(Error::UnbalancedBrackets(index))?;
                let (length, radius) = self
                    .branch_stack
                    .pop()
                    .ok_or(Error::UnbalancedBrackets(index))?;
                self.position = position;
                self.heading = heading;
                self.length = length;
                self.radius = radius;
            }
            // Placeholder symbols (X and anything unrecognized) move nothing
            // but do end a turn sequence.
            _ => self.already_turned = false,
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> TreeGeometry {
        self.out
    }

    /// Apply the one-shot radius decay: only the first rotation operator
    /// since the flag was last cleared shrinks the radius.
    fn decay_radius_once(&mut self) {
        if !self.already_turned {
            self.radius *= RADIUS_DECAY;
            self.already_turned = true;
        }
    }

    /// Leaf cluster approximation at a branch tip: current position, heading
    /// nudged by a bounded random offset, uniform scale jitter.
    fn emit_tip_leaf(&mut self, rng: &mut Rng) {
        let offset = 2.0
            * Vec3::new(
                rng.range_f32(-0.5, 0.5),
                rng.range_f32(-0.9, 0.1),
                rng.range_f32(-0.5, 0.5),
            );
        let direction = (self.heading.truncate() + offset).normalize();
        let scale_jitter = rng.range_f32(0.75, 1.25);
        let scale = self.leaf_size * LEAF_SCALE * scale_jitter;
        let transform = Mat4::from_translation(self.position.truncate())
            * Mat4::from_quat(heading_rotation(direction))
            * Mat4::from_scale(Vec3::new(scale, scale, 1.0));
        self.out.leaves.push(transform);
    }
}

/// Quaternion rotating the +Y axis onto `dir`.
fn heading_rotation(dir: Vec3) -> Quat {
    Quat::from_rotation_arc(Vec3::Y, dir.normalize_or(Vec3::Y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TreeParams {
        TreeParams::default()
    }

    #[test]
    fn test_single_forward_emits_one_branch() {
        let mut rng = Rng::new(11);
        let geo = interpret("F", &params(), &mut rng).unwrap();
        assert_eq!(geo.branches.len(), 1);
        assert_eq!(geo.leaves.len(), 0);
    }

    #[test]
    fn test_forward_advances_along_heading() {
        let p = params();
        let mut rng = Rng::new(11);
        let mut turtle = Turtle::new(&p);
        let start = turtle.position;
        turtle.step('F', 0, &mut rng).unwrap();
        let moved = (turtle.position - start).truncate();
        // Straight up, by a length within the +/-15% sample range.
        assert!(moved.x.abs() < 1e-6 && moved.z.abs() < 1e-6);
        assert!(moved.y >= p.branch_length * (1.0 - JITTER) - 1e-5);
        assert!(moved.y <= p.branch_length * (1.0 + JITTER) + 1e-5);
    }

    #[test]
    fn test_bracketed_branch_restores_position() {
        let p = params();
        let mut rng = Rng::new(3);
        let mut turtle = Turtle::new(&p);
        let start = turtle.position;
        for (i, c) in "[F]".char_indices() {
            turtle.step(c, i, &mut rng).unwrap();
        }
        assert!((turtle.position - start).length() < 1e-6);
        // One extra leaf emitted at the pop.
        let geo = turtle.finish();
        assert_eq!(geo.branches.len(), 1);
        assert_eq!(geo.leaves.len(), 1);
    }

    #[test]
    fn test_pop_on_empty_stack_fails() {
        let mut rng = Rng::new(0);
        let err = interpret("]", &params(), &mut rng).unwrap_err();
        assert!(matches!(err, Error::UnbalancedBrackets(0)));
    }

    #[test]
    fn test_radius_decays_once_per_turn_sequence() {
        let p = params();
        let mut rng = Rng::new(42);
        let mut turtle = Turtle::new(&p);
        turtle.step('+', 0, &mut rng).unwrap();
        let after_first = turtle.radius;
        assert!((after_first - p.branch_radius * RADIUS_DECAY).abs() < 1e-6);
        // Consecutive rotation operators must not decay again.
        turtle.step('-', 1, &mut rng).unwrap();
        turtle.step('^', 2, &mut rng).unwrap();
        assert_eq!(turtle.radius, after_first);
        // F clears the flag; the next rotation decays once more.
        turtle.step('F', 3, &mut rng).unwrap();
        turtle.step('/', 4, &mut rng).unwrap();
        assert!((turtle.radius - after_first * RADIUS_DECAY).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_symbol_clears_turn_flag() {
        let p = params();
        let mut rng = Rng::new(8);
        let mut turtle = Turtle::new(&p);
        turtle.step('+', 0, &mut rng).unwrap();
        let decayed = turtle.radius;
        turtle.step('X', 1, &mut rng).unwrap();
        turtle.step('+', 2, &mut rng).unwrap();
        assert!((turtle.radius - decayed * RADIUS_DECAY).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_keeps_heading_normalized() {
        let p = params();
        let mut rng = Rng::new(21);
        let mut turtle = Turtle::new(&p);
        for (i, c) in "+&/\\^-".char_indices() {
            turtle.step(c, i, &mut rng).unwrap();
            assert!((turtle.heading.truncate().length() - 1.0).abs() < 1e-5);
            assert_eq!(turtle.heading.w, 0.0);
        }
    }

    #[test]
    fn test_inline_leaf_does_not_move_turtle() {
        let p = params();
        let mut rng = Rng::new(2);
        let mut turtle = Turtle::new(&p);
        let start = turtle.position;
        turtle.step('L', 0, &mut rng).unwrap();
        assert_eq!(turtle.position, start);
        assert_eq!(turtle.finish().leaves.len(), 1);
    }

    #[test]
    fn test_stacks_stay_in_lockstep() {
        let p = params();
        let mut rng = Rng::new(17);
        let mut turtle = Turtle::new(&p);
        for (i, c) in "[[F]+F]".char_indices() {
            turtle.step(c, i, &mut rng).unwrap();
        }
        assert_eq!(turtle.turtle_stack.len(), turtle.branch_stack.len());
        assert!(turtle.turtle_stack.is_empty());
    }

    #[test]
    fn test_branch_scale_encodes_sampled_radius() {
        let p = params();
        let mut rng = Rng::new(5);
        let geo = interpret("F", &p, &mut rng).unwrap();
        // X scale column length = radius/2, within the sample range.
        let x_scale = geo.branches[0].x_axis.truncate().length();
        let lo = p.branch_radius * (1.0 - JITTER) * 0.5;
        let hi = p.branch_radius * (1.0 + JITTER) * 0.5;
        assert!(x_scale >= lo - 1e-5 && x_scale <= hi + 1e-5);
    }
}
