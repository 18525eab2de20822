//! Prints the CRD manifests as a multi-document YAML stream.

use crds::{CloudStackCluster, CloudStackFailureDomain};
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    let documents = [CloudStackCluster::crd(), CloudStackFailureDomain::crd()];
    for crd in documents {
        println!("---");
        print!("{}", serde_yaml::to_string(&crd)?);
    }
    Ok(())
}
