use spacebattle::analysis::BattleAnalysis;
use spacebattle::combat::{Battle, ExcitingBattle, ExcitingDamage, Rng, StateId};
use spacebattle::markov::rational::{is_distribution, round_to, to_f64};
use spacebattle::markov::{Matrix, Probability};

// Fig 5.7 of the reference analysis.
const EXPECTED_P: [[&str; 14]; 14] = [
    ["5/192", "0", "0", "0", "0", "0", "0", "0", "0", "0", "0", "0", "0", "0"],
    ["5/144", "5/192", "0", "0", "0", "0", "0", "0", "0", "0", "0", "0", "0", "0"],
    ["25/576", "125/1728", "25/144", "0", "0", "0", "0", "0", "0", "0", "0", "0", "0", "0"],
    ["11/192", "0", "0", "5/192", "0", "0", "0", "0", "0", "0", "0", "0", "0", "0"],
    ["11/144", "11/192", "0", "5/144", "5/192", "0", "0", "0", "0", "0", "0", "0", "0", "0"],
    ["55/576", "275/1728", "25/144", "25/576", "125/1728", "25/144", "0", "0", "0", "0", "0", "0", "0", "0"],
    ["25/576", "0", "0", "0", "0", "0", "25/288", "0", "0", "0", "0", "0", "0", "0"],
    ["5/144", "5/288", "0", "0", "0", "0", "55/288", "25/288", "0", "0", "0", "0", "0", "0"],
    ["55/576", "0", "0", "25/576", "0", "0", "5/48", "0", "25/288", "0", "0", "0", "0", "0"],
    ["11/144", "11/288", "0", "5/144", "5/288", "0", "11/48", "5/48", "55/288", "25/288", "0", "0", "0", "0"],
    ["1/8", "4/9", "47/72", "23/192", "23/54", "47/72", "1/3", "19/24", "1/3", "19/24", "1", "0", "0", "0"],
    ["7/24", "5/27", "0", "21/32", "5/12", "25/144", "1/18", "5/288", "7/18", "35/288", "0", "1", "0", "0"],
    ["0", "0", "0", "7/192", "5/216", "0", "0", "0", "0", "0", "0", "0", "1", "0"],
    ["0", "0", "0", "1/192", "1/54", "0", "0", "0", "0", "0", "0", "0", "0", "1"],
];

const EXPECTED_N: [[&str; 10]; 10] = [
    ["192/187", "0", "0", "0", "0", "0", "0", "0", "0", "0"],
    ["1280/34969", "192/187", "0", "0", "0", "0", "0", "0", "0", "0"],
    ["713200/12483933", "2000/22253", "144/119", "0", "0", "0", "0", "0", "0", "0"],
    ["192/3179", "0", "0", "192/187", "0", "0", "0", "0", "0", "0"],
    ["50432/594473", "192/3179", "0", "1280/34969", "192/187", "0", "0", "0", "0", "0"],
    [
        "220290160/1485588027",
        "587600/2648107",
        "3600/14161",
        "713200/12483933",
        "2000/22253",
        "144/119",
        "0",
        "0",
        "0",
        "0",
    ],
    ["2400/49181", "0", "0", "0", "0", "0", "288/263", "0", "0", "0"],
    ["120794720/2418770761", "960/49181", "0", "0", "0", "0", "15840/69169", "288/263", "0", "0"],
    ["25462080/219888251", "0", "0", "2400/49181", "0", "0", "8640/69169", "0", "288/263", "0"],
    [
        "1443557753664/10814324072431",
        "10184832/219888251",
        "0",
        "120794720/2418770761",
        "960/49181",
        "0",
        "5949504/18191447",
        "8640/69169",
        "15840/69169",
        "288/263",
    ],
];

const EXPECTED_RN: [[&str; 10]; 4] = [
    [
        "126998994170048261/243224962713045621",
        "1216084455128/1648502217747",
        "13536/14161",
        "163682641957/706500950463",
        "2448982/4788441",
        "94/119",
        "15405708/18191447",
        "66804/69169",
        "37788/69169",
        "228/263",
    ],
    [
        "114754141789105432/243224962713045621",
        "428269282675/1648502217747",
        "625/14161",
        "5626677558214/7771510455093",
        "23480665/52672851",
        "25/119",
        "2785739/18191447",
        "2365/69169",
        "31381/69169",
        "35/263",
    ],
    ["66863/16050771", "40/28611", "0", "36143/944163", "40/1683", "0", "0", "0", "0", "0"],
    ["30265/16050771", "32/28611", "0", "5689/944163", "32/1683", "0", "0", "0", "0", "0"],
];

const EXPECTED_ONER: [[&str; 10]; 1] = [[
    "15872756208302016/9008331952335023",
    "268292298048/183166913083",
    "20736/14161",
    "1052790220912/863501161677",
    "6649264/5852539",
    "144/119",
    "32308416/18191447",
    "84384/69169",
    "91584/69169",
    "288/263",
]];

const ROUNDED_RN: [[f64; 10]; 4] = [
    [0.52, 0.74, 0.96, 0.23, 0.51, 0.79, 0.85, 0.97, 0.55, 0.87],
    [0.47, 0.26, 0.04, 0.72, 0.45, 0.21, 0.15, 0.03, 0.45, 0.13],
    [0.0, 0.0, 0.0, 0.04, 0.02, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 0.01, 0.02, 0.0, 0.0, 0.0, 0.0, 0.0],
];

const ROUNDED_ONER: [f64; 10] = [1.8, 1.5, 1.5, 1.2, 1.1, 1.2, 1.8, 1.2, 1.3, 1.1];

fn exact<const R: usize, const C: usize>(rows: &[[&str; C]; R]) -> Matrix {
    Matrix::from_rows(
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|value| value.parse::<Probability>().expect("fixture fraction"))
                    .collect()
            })
            .collect(),
    )
    .expect("fixture matrix")
}

fn state(n: usize) -> StateId {
    StateId::new(n).unwrap()
}

fn analysis() -> BattleAnalysis {
    BattleAnalysis::analyze(&ExcitingBattle::new().unwrap()).unwrap()
}

#[test]
fn transition_matrix_is_pinned_exactly() {
    let battle = ExcitingBattle::new().unwrap();
    assert_eq!(battle.transition_matrix().unwrap(), exact(&EXPECTED_P));
}

#[test]
fn fundamental_matrix_is_pinned_exactly() {
    assert_eq!(analysis().chain().fundamental(), &exact(&EXPECTED_N));
}

#[test]
fn absorption_probabilities_are_pinned_exactly() {
    assert_eq!(analysis().chain().absorption(), &exact(&EXPECTED_RN));
}

#[test]
fn expected_rounds_are_pinned_exactly() {
    assert_eq!(analysis().chain().expected_rounds(), &exact(&EXPECTED_ONER));
}

#[test]
fn fundamental_inverts_i_minus_q() {
    let analysis = analysis();
    let chain = analysis.chain();
    let i_minus_q = Matrix::identity(10).sub(chain.q()).unwrap();
    assert_eq!(i_minus_q.mul(chain.fundamental()).unwrap(), Matrix::identity(10));
}

#[test]
fn rounded_values_match_published_tables() {
    let analysis = analysis();
    for (row, expected) in analysis.chain().absorption().to_f64_rows().iter().zip(ROUNDED_RN) {
        for (value, want) in row.iter().zip(expected) {
            assert!((round_to(*value, 2) - want).abs() < 0.005, "{value} rounds away from {want}");
        }
    }
    let rounds = analysis.chain().expected_rounds().to_f64_rows();
    for (value, want) in rounds[0].iter().zip(ROUNDED_ONER) {
        assert!((round_to(*value, 1) - want).abs() < 0.005, "{value} rounds away from {want}");
    }
}

#[test]
fn every_state_has_a_distribution() {
    let battle = ExcitingBattle::new().unwrap();
    for s in 1..=14 {
        let dist = battle.transition_distribution(state(s)).unwrap();
        assert!(is_distribution(&dist), "state {s}");
        assert!(dist.keys().all(|next| next.get() >= 1 && next.get() <= 14));
    }
}

#[test]
fn terminal_states_are_idempotent() {
    let battle = ExcitingBattle::new().unwrap();
    let mut rng = Rng::new(3);
    for s in 11..=14 {
        let dist = battle.transition_distribution(state(s)).unwrap();
        assert_eq!(dist.len(), 1);
        assert!(dist.contains_key(&state(s)));
        assert_eq!(battle.combat_transition(state(s), &mut rng).unwrap(), state(s));
    }
}

#[test]
fn catalog_partitions_the_damage_space() {
    let battle = ExcitingBattle::new().unwrap();
    let space = battle.damage_space();
    assert_eq!(space.len(), 30);
    assert!(battle.catalog().covers_exactly(space.iter().cloned()));
    assert_eq!(
        battle.state_for_damage(&ExcitingDamage::new(1, 2, 4)).unwrap(),
        state(14)
    );
    assert_eq!(
        battle.state_for_damage(&ExcitingDamage::new(0, 2, 3)).unwrap(),
        state(12)
    );
    assert!(battle.state_for_damage(&ExcitingDamage::new(2, 0, 0)).is_err());
}

#[test]
fn rebels_usually_lose_from_the_start() {
    let outcomes = analysis().outcome_distribution(state(1)).unwrap();
    let destroyer_wins = to_f64(&outcomes[&state(11)]);
    let destroyer_crippled = to_f64(&outcomes[&state(12)]);
    assert!((destroyer_wins - 0.522).abs() < 0.001);
    assert!((destroyer_crippled - 0.472).abs() < 0.001);
}
