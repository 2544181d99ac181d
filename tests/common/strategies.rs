use proptest::prelude::*;

/// Task names as producers generate them, plus short names that collide often.
pub fn task_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,3}",
        "(dependent|supervisor)-[1-3]-task-[0-9]{1,4}",
    ]
}

pub fn priority_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![
        4 => 1i64..=10,
        1 => -5i64..=0,
        1 => Just(i64::MAX - 1),
    ]
}

/// A batch of submissions, duplicates included.
pub fn submissions_strategy() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::vec((task_name_strategy(), priority_strategy()), 1..40)
}

/// One thing a role can do to the board.
#[derive(Debug, Clone)]
pub enum BoardOp {
    Add(String, i64),
    Escalate(String),
    Tick,
}

pub fn board_op_strategy() -> impl Strategy<Value = BoardOp> {
    prop_oneof![
        3 => (task_name_strategy(), priority_strategy())
            .prop_map(|(name, priority)| BoardOp::Add(name, priority)),
        1 => task_name_strategy().prop_map(BoardOp::Escalate),
        2 => Just(BoardOp::Tick),
    ]
}

pub fn board_ops_strategy() -> impl Strategy<Value = Vec<BoardOp>> {
    prop::collection::vec(board_op_strategy(), 1..60)
}
