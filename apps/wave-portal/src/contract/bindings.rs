use alloy::sol;

sol! {
    #[sol(rpc)]
    contract WavePortal {
        struct Wave {
            address waver;
            string message;
            uint256 timestamp;
        }

        event NewWave(address indexed from, uint256 timestamp, string message);

        function wave(string _message) public;

        function getAllWaves() public view returns (Wave[] memory);

        function getTotalWaves() public view returns (uint256);
    }
}
