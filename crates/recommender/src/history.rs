use catalog::CatalogStore;
use common::Song;
use rand::Rng;

pub fn sample_history<R: Rng + ?Sized>(store: &CatalogStore, count: usize, rng: &mut R) -> Vec<Song> {
    let amount = count.min(store.len());
    rand::seq::index::sample(rng, store.len(), amount)
        .into_iter()
        .map(|index| store.songs()[index].clone())
        .collect()
}
